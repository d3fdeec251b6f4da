//! BLK payload decoding: tag dispatch, decompression, name resolution, and
//! block hierarchy reconstruction.

use vromfs_cursor::ByteCursor;

use crate::block::Block;
use crate::error::{BlkError, DecodeWarning, Result};
use crate::params::{decode_value, ParamRecord};

/// Tag byte classes. Exact numeric values are not confirmed against a
/// reference archive (see DESIGN.md); `PLAIN`'s value is pinned by the
/// concrete seed case in the spec's testable properties, the others are
/// inferred to keep the four classes distinct and contiguous.
const TAG_SLIM: u8 = 0x00;
const TAG_PLAIN: u8 = 0x01;
const TAG_ZSTD: u8 = 0x02;
const TAG_ZSTD_DICT: u8 = 0x03;

fn is_zstd(tag: u8) -> bool {
    matches!(tag, TAG_ZSTD | TAG_ZSTD_DICT)
}

fn needs_dict(tag: u8) -> bool {
    tag == TAG_ZSTD_DICT
}

fn is_slim(tag: u8) -> bool {
    matches!(tag, TAG_SLIM | TAG_ZSTD_DICT)
}

/// Lossy name decode marker used when a slim name map entry is not valid
/// UTF-8, mirroring the source's `"BADBADBAD"` prefix convention.
const BAD_NAME_MARKER: &str = "BADBADBAD";

struct BlockHeader {
    name_id: u32,
    param_count: u64,
    block_count: u64,
    first_block_id: u64,
}

/// Decodes a single BLK payload into a tree of named blocks, discarding any
/// non-fatal warnings. See [`decode_with_warnings`] to observe them.
pub fn decode(raw: &[u8], name_map: Option<&[Vec<u8>]>, zstd_dict: Option<&[u8]>) -> Result<Block> {
    decode_with_warnings(raw, name_map, zstd_dict).map(|(block, _)| block)
}

/// Decodes a single BLK payload into a tree of named blocks.
///
/// `name_map` is the archive-level name map (required for slim variants);
/// `zstd_dict` is the archive-level ZSTD dictionary (required for
/// dict-compressed variants). Non-fatal conditions (name-map length
/// mismatch, streaming-frame ZSTD fallback) are reported rather than
/// failing the decode.
pub fn decode_with_warnings(
    raw: &[u8],
    name_map: Option<&[Vec<u8>]>,
    zstd_dict: Option<&[u8]>,
) -> Result<(Block, Vec<DecodeWarning>)> {
    let tag = raw[0];
    let body = &raw[1..];

    if needs_dict(tag) && zstd_dict.is_none() {
        return Err(BlkError::MissingDict);
    }
    if is_slim(tag) && name_map.is_none() {
        return Err(BlkError::MissingNamemap);
    }

    let mut warnings = Vec::new();

    let data = if is_zstd(tag) {
        decompress(body, if needs_dict(tag) { zstd_dict } else { None }, &mut warnings)?
    } else {
        body.to_vec()
    };

    let mut cursor = ByteCursor::new(&data);

    let names_in_name_map = cursor.uleb128()?;

    let names: Vec<String> = if is_slim(tag) {
        name_map
            .unwrap()
            .iter()
            .map(|name| match std::str::from_utf8(name) {
                Ok(s) => s.to_string(),
                Err(_) => format!("{BAD_NAME_MARKER}{}", String::from_utf8_lossy(name)),
            })
            .collect()
    } else {
        let name_map_size = cursor.uleb128()?;
        let blob = cursor.fetch(name_map_size as usize - 1)?;
        cursor.advance(1)?;
        let names: Vec<String> = blob
            .split(|&b| b == 0)
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect();
        if names.len() as u64 != names_in_name_map {
            warnings.push(DecodeWarning::NameMapLengthMismatch {
                expected: names_in_name_map,
                actual: names.len() as u64,
            });
        }
        names
    };

    let num_blocks = cursor.uleb128()? as usize;
    let num_params = cursor.uleb128()? as usize;
    let params_data_size = cursor.uleb128()?;
    let params_data = cursor.fetch(params_data_size as usize)?;

    let mut values = Vec::with_capacity(num_params);
    for _ in 0..num_params {
        let bytes: [u8; 8] = cursor.fetch(8)?.try_into().unwrap();
        let record = ParamRecord::unpack(&bytes);
        let value = decode_value(&record, params_data)?;
        let name = names
            .get(record.name_id as usize)
            .cloned()
            .unwrap_or_default();
        values.push((name, value));
    }

    let mut headers = Vec::with_capacity(num_blocks);
    for _ in 0..num_blocks {
        let name_id = cursor.uleb128()? as u32;
        let param_count = cursor.uleb128()?;
        let block_count = cursor.uleb128()?;
        let first_block_id = if block_count > 0 { cursor.uleb128()? } else { 0 };
        headers.push(BlockHeader {
            name_id,
            param_count,
            block_count,
            first_block_id,
        });
    }

    let mut flat: Vec<Block> = Vec::with_capacity(headers.len());
    let mut param_ptr = 0usize;
    for (i, header) in headers.iter().enumerate() {
        let name = if i == 0 {
            "root".to_string()
        } else {
            names
                .get(header.name_id as usize - 1)
                .cloned()
                .unwrap_or_default()
        };
        let mut block = Block::new(name);
        let count = header.param_count as usize;
        block
            .params
            .extend_from_slice(&values[param_ptr..param_ptr + count]);
        param_ptr += count;
        flat.push(block);
    }

    lift_children(&headers, &mut flat)?;

    let root = flat.into_iter().next().unwrap_or_else(|| Block::new("root"));
    Ok((root, warnings))
}

/// Second pass: lifts each block's children out of the flat array using an
/// explicit work stack rather than recursion, so adversarial block counts
/// cannot blow the call stack.
fn lift_children(headers: &[BlockHeader], flat: &mut [Block]) -> Result<()> {
    // Collect each parent's child range first (indices are stable while we
    // only read `headers`), then assemble bottom-up by draining the flat
    // array from the tail so earlier indices can still borrow later ones.
    let mut stack = vec![0usize];
    let mut order = Vec::with_capacity(headers.len());
    let mut visited = vec![false; headers.len()];

    while let Some(idx) = stack.pop() {
        if idx >= headers.len() {
            return Err(BlkError::BadHierarchy(format!(
                "block index {idx} out of range ({} blocks)",
                headers.len()
            )));
        }
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        order.push(idx);
        let header = &headers[idx];
        for i in 0..header.block_count {
            stack.push(header.first_block_id as usize + i as usize);
        }
    }

    // Process in reverse discovery order so every child is fully built
    // (including its own children) before its parent takes ownership of it.
    for &idx in order.iter().rev() {
        let header = &headers[idx];
        if header.block_count == 0 {
            continue;
        }
        let start = header.first_block_id as usize;
        let end = start + header.block_count as usize;
        if end > flat.len() {
            return Err(BlkError::BadHierarchy(format!(
                "child range {start}..{end} exceeds {} blocks",
                flat.len()
            )));
        }
        let children: Vec<Block> = flat[start..end]
            .iter()
            .map(|b| Block {
                name: b.name.clone(),
                params: b.params.clone(),
                children: b.children.clone(),
            })
            .collect();
        flat[idx].children = children;
    }

    Ok(())
}

/// A BLK body rarely exceeds a handful of kilobytes once expanded; this
/// multiplier on the compressed length is a cheap capacity guess for the
/// bounded single-shot attempt below.
const SINGLE_SHOT_CAPACITY_MULTIPLIER: usize = 8;
const SINGLE_SHOT_MIN_CAPACITY: usize = 64;

/// Decompresses a BLK body with a dictionary via the streaming reader; there
/// is no bounded one-shot dictionary API in the corpus this crate draws on,
/// so the dictionary path has no single-shot/fallback split.
fn decompress_with_dict(body: &[u8], dict: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = zstd::stream::read::Decoder::with_dictionary(body, dict)
        .map_err(|e| BlkError::DecompressionFailed(e.to_string()))?;
    let mut out = Vec::new();
    std::io::Read::read_to_end(&mut decoder, &mut out)
        .map_err(|e| BlkError::DecompressionFailed(e.to_string()))?;
    Ok(out)
}

/// Bounded single-shot ZSTD decompression, falling back to the unbounded
/// streaming reader when the guessed capacity is too small for the actual
/// output (some BLK bodies inside VROMFS compress at very high ratios).
/// Records a warning when the fallback is needed.
fn decompress(body: &[u8], dict: Option<&[u8]>, warnings: &mut Vec<DecodeWarning>) -> Result<Vec<u8>> {
    if let Some(dict) = dict {
        return decompress_with_dict(body, dict);
    }

    let guessed_capacity = body
        .len()
        .saturating_mul(SINGLE_SHOT_CAPACITY_MULTIPLIER)
        .max(SINGLE_SHOT_MIN_CAPACITY);

    if let Ok(data) = zstd::bulk::decompress(body, guessed_capacity) {
        return Ok(data);
    }

    warnings.push(DecodeWarning::StreamingFrameFallback);

    let mut decoder =
        zstd::stream::read::Decoder::new(body).map_err(|e| BlkError::DecompressionFailed(e.to_string()))?;
    let mut out = Vec::new();
    std::io::Read::read_to_end(&mut decoder, &mut out)
        .map_err(|e| BlkError::DecompressionFailed(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uleb(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        let mut v = value;
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            out.push(byte);
            if v == 0 {
                break;
            }
        }
        out
    }

    #[test]
    fn single_root_block_with_no_children_or_params() {
        let mut payload = vec![TAG_PLAIN];
        payload.extend(uleb(1)); // names_in_name_map
        payload.extend(uleb(5)); // name_map_size: 4-byte blob + 1 pad byte
        payload.extend_from_slice(b"foo\x00");
        payload.push(0x00); // pad byte consumed by the post-blob advance(1)
        payload.extend(uleb(1)); // num_blocks
        payload.extend(uleb(0)); // num_params
        payload.extend(uleb(0)); // params_data_size
        // block 0 header: name_id=0, param_count=0, block_count=0
        payload.extend(uleb(0));
        payload.extend(uleb(0));
        payload.extend(uleb(0));

        let block = decode(&payload, None, None).unwrap();
        assert_eq!(block.name, "root");
        assert!(block.children.is_empty());
        assert!(block.params.is_empty());
    }

    #[test]
    fn slim_without_namemap_is_missing_namemap_error() {
        let payload = vec![TAG_SLIM, 0x00];
        let err = decode(&payload, None, None);
        assert!(matches!(err, Err(BlkError::MissingNamemap)));
    }

    #[test]
    fn dict_tag_without_dict_is_missing_dict_error() {
        let payload = vec![TAG_ZSTD_DICT];
        let err = decode(&payload, Some(&[]), None);
        assert!(matches!(err, Err(BlkError::MissingDict)));
    }

    #[test]
    fn nested_blocks_reconstruct_parent_child_links() {
        let mut payload = vec![TAG_PLAIN];
        payload.extend(uleb(2));
        let names_blob = b"a\x00b\x00";
        payload.extend(uleb(names_blob.len() as u64 + 1));
        payload.extend_from_slice(names_blob);
        payload.push(0x00); // pad byte consumed by the post-blob advance(1)
        payload.extend(uleb(3)); // num_blocks: root, a, b
        payload.extend(uleb(0)); // num_params
        payload.extend(uleb(0)); // params_data_size

        // root: name_id=0, param_count=0, block_count=2, first_block_id=1
        payload.extend(uleb(0));
        payload.extend(uleb(0));
        payload.extend(uleb(2));
        payload.extend(uleb(1));
        // a: name_id=1, no children
        payload.extend(uleb(1));
        payload.extend(uleb(0));
        payload.extend(uleb(0));
        // b: name_id=2, no children
        payload.extend(uleb(2));
        payload.extend(uleb(0));
        payload.extend(uleb(0));

        let block = decode(&payload, None, None).unwrap();
        assert_eq!(block.name, "root");
        let child_names: Vec<&str> = block.children.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(child_names, vec!["a", "b"]);
    }

    #[test]
    fn name_map_length_mismatch_is_a_warning_not_an_error() {
        let mut payload = vec![TAG_PLAIN];
        payload.extend(uleb(99)); // names_in_name_map: deliberately wrong
        let names_blob = b"foo\x00";
        payload.extend(uleb(names_blob.len() as u64 + 1));
        payload.extend_from_slice(names_blob);
        payload.push(0x00); // pad byte consumed by the post-blob advance(1)
        payload.extend(uleb(1));
        payload.extend(uleb(0));
        payload.extend(uleb(0));
        payload.extend(uleb(0));
        payload.extend(uleb(0));
        payload.extend(uleb(0));

        let (block, warnings) = decode_with_warnings(&payload, None, None).unwrap();
        assert_eq!(block.name, "root");
        assert_eq!(
            warnings,
            vec![DecodeWarning::NameMapLengthMismatch {
                expected: 99,
                actual: 1
            }]
        );
    }

    /// The uncompressed body of a single root block with no children or
    /// params, matching the layout `single_root_block_with_no_children_or_params`
    /// builds by hand, reused here as ZSTD's plaintext input.
    fn single_root_body() -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(uleb(1)); // names_in_name_map
        body.extend(uleb(5)); // name_map_size
        body.extend_from_slice(b"foo\x00");
        body.push(0x00); // pad byte consumed by the post-blob advance(1)
        body.extend(uleb(1)); // num_blocks
        body.extend(uleb(0)); // num_params
        body.extend(uleb(0)); // params_data_size
        body.extend(uleb(0));
        body.extend(uleb(0));
        body.extend(uleb(0));
        body
    }

    #[test]
    fn zstd_compressed_payload_decodes_successfully() {
        let body = single_root_body();
        let compressed = zstd::encode_all(body.as_slice(), 3).unwrap();

        let mut payload = vec![TAG_ZSTD];
        payload.extend(compressed);

        let (block, warnings) = decode_with_warnings(&payload, None, None).unwrap();
        assert_eq!(block.name, "root");
        assert!(warnings.is_empty());
    }

    #[test]
    fn zstd_dict_compressed_payload_decodes_with_dictionary() {
        // TAG_ZSTD_DICT is a slim variant: names come from the archive-level
        // name map, not an inline blob, so the body has no name table at all.
        let mut body = Vec::new();
        body.extend(uleb(1)); // names_in_name_map (unused for slim variants)
        body.extend(uleb(1)); // num_blocks
        body.extend(uleb(0)); // num_params
        body.extend(uleb(0)); // params_data_size
        body.extend(uleb(0)); // block 0: name_id=0, param_count=0, block_count=0
        body.extend(uleb(0));
        body.extend(uleb(0));

        let dict = b"a reusable dictionary blob for testing".to_vec();
        let mut encoder = zstd::stream::write::Encoder::with_dictionary(Vec::new(), 3, &dict).unwrap();
        std::io::Write::write_all(&mut encoder, &body).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut payload = vec![TAG_ZSTD_DICT];
        payload.extend(compressed);

        let name_map = vec![b"foo".to_vec()];
        let block = decode(&payload, Some(&name_map), Some(&dict)).unwrap();
        assert_eq!(block.name, "root");
    }

    #[test]
    fn single_shot_succeeds_without_warning_when_capacity_guess_is_sufficient() {
        let body = single_root_body();
        let compressed = zstd::encode_all(body.as_slice(), 3).unwrap();

        let mut warnings = Vec::new();
        let decompressed = decompress(&compressed, None, &mut warnings).unwrap();
        assert_eq!(decompressed, body);
        assert!(warnings.is_empty());
    }

    #[test]
    fn undersized_capacity_guess_falls_back_to_streaming_decode() {
        // 1MB of zeros compresses at a ratio far beyond the single-shot
        // capacity guess (8x the compressed length), forcing the fallback.
        let large = vec![0u8; 1_000_000];
        let compressed = zstd::encode_all(large.as_slice(), 3).unwrap();
        assert!(compressed.len() * SINGLE_SHOT_CAPACITY_MULTIPLIER < large.len());

        let mut warnings = Vec::new();
        let decompressed = decompress(&compressed, None, &mut warnings).unwrap();
        assert_eq!(decompressed, large);
        assert_eq!(warnings, vec![DecodeWarning::StreamingFrameFallback]);
    }
}

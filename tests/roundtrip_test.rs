//! Close-then-reopen round trips across backends

use pretty_assertions::assert_eq;
use std::io::Read;
use wad_storage::{OpenMode, WadBuffer, WadError, WadFile, WadKind, WadMap};

/// Apply a representative mutation sequence.
fn mutate<B: wad_storage::Backend>(wad: &mut wad_storage::Wad<B>) {
    wad.add_marker("E1M1").unwrap();
    wad.append("THINGS", &[1; 40]).unwrap();
    wad.append("LINEDEFS", &[2; 28]).unwrap();
    wad.append("VERTEXES", &[3; 16]).unwrap();
    wad.insert_at(1, "LABEL", b"hello").unwrap();
    wad.replace(3, &[4; 50]).unwrap();
    wad.rename(4, "SEGS").unwrap();
    wad.delete(2).unwrap();
}

fn snapshot<B: wad_storage::Backend>(
    wad: &mut wad_storage::Wad<B>,
) -> Vec<(String, u32, Vec<u8>)> {
    let entries: Vec<_> = wad.entries().copied().collect();
    entries
        .iter()
        .map(|e| {
            (
                e.name.as_str().to_string(),
                e.length,
                wad.read_entry(e).unwrap(),
            )
        })
        .collect()
}

#[test]
fn buffer_round_trip() {
    let mut wad = WadBuffer::new(WadKind::Pwad);
    mutate(&mut wad);
    let expected = snapshot(&mut wad);
    let bytes = wad.to_bytes().unwrap();

    let mut reopened = WadBuffer::from_bytes(&bytes).unwrap();
    assert_eq!(reopened.kind(), WadKind::Pwad);
    assert_eq!(snapshot(&mut reopened), expected);
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.wad");

    let mut wad = WadFile::create(&path).unwrap();
    mutate(&mut wad);
    let expected = snapshot(&mut wad);
    wad.close().unwrap();

    let mut reopened = WadFile::open(&path).unwrap();
    assert_eq!(snapshot(&mut reopened), expected);

    // The same archive reads identically through the mapped backend.
    let mut mapped = WadMap::open(&path).unwrap();
    assert_eq!(snapshot(&mut mapped), expected);
}

#[test]
fn iwad_kind_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("primary.wad");

    let mut wad = WadFile::create_with(&path, WadKind::Iwad).unwrap();
    wad.append("PLAYPAL", &[0; 768]).unwrap();
    wad.close().unwrap();

    let reopened = WadFile::open(&path).unwrap();
    assert!(reopened.is_iwad());
    assert!(!reopened.is_pwad());
}

#[test]
fn compact_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compacted.wad");

    let mut wad = WadFile::create(&path).unwrap();
    mutate(&mut wad);
    wad.compact().unwrap();
    let expected = snapshot(&mut wad);
    wad.close().unwrap();

    let mut reopened = WadFile::open(&path).unwrap();
    assert_eq!(snapshot(&mut reopened), expected);
    assert_eq!(reopened.stats().orphaned_bytes, 0);
}

#[test]
fn streams_are_independent_cursors() {
    let mut wad = WadBuffer::new(WadKind::Pwad);
    wad.append("ALPHA", b"alpha-bytes").unwrap();
    wad.append("BETA", b"beta-bytes").unwrap();

    let mut a = wad.open_stream(0).unwrap();
    let mut b = wad.open_stream(1).unwrap();

    let mut buf = [0u8; 5];
    a.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"alpha");

    let mut all = Vec::new();
    b.read_to_end(&mut all).unwrap();
    assert_eq!(all, b"beta-bytes");

    // The first stream's cursor is unaffected by the second.
    let mut rest = Vec::new();
    a.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"-bytes");
}

#[test]
fn stream_is_bounded_to_entry_length() {
    let mut wad = WadBuffer::new(WadKind::Pwad);
    wad.append("SHORT", b"abc").unwrap();
    wad.append("AFTER", b"should not leak").unwrap();

    let mut stream = wad.open_stream(0).unwrap();
    let mut all = Vec::new();
    stream.read_to_end(&mut all).unwrap();
    assert_eq!(all, b"abc");
    assert_eq!(stream.remaining(), 0);
}

#[test]
fn strict_open_rejects_out_of_range_entry() {
    let mut wad = WadBuffer::new(WadKind::Pwad);
    wad.append("GOOD", b"good").unwrap();
    let mut bytes = wad.to_bytes().unwrap();

    // Corrupt the first directory record's offset (first 4 bytes of the
    // table, which sits at the directory offset from the header).
    let dir_offset = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    bytes[dir_offset..dir_offset + 4].copy_from_slice(&0x7FFF_0000i32.to_le_bytes());

    match WadBuffer::from_bytes(&bytes) {
        Err(WadError::CorruptDirectory { index, .. }) => assert_eq!(index, 0),
        other => panic!("expected CorruptDirectory, got {other:?}"),
    }
}

#[test]
fn best_effort_open_drops_bad_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.wad");

    let mut wad = WadFile::create(&path).unwrap();
    wad.append("GOOD", b"good").unwrap();
    wad.append("BAD", b"bad!").unwrap();
    wad.close().unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let dir_offset = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    let second = dir_offset + 16;
    bytes[second..second + 4].copy_from_slice(&0x7FFF_0000i32.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    assert!(WadFile::open(&path).is_err());

    let mut recovered = WadFile::open_with(&path, OpenMode::BestEffort).unwrap();
    assert_eq!(recovered.entry_count(), 1);
    assert_eq!(recovered.read_bytes_named("GOOD").unwrap().unwrap(), b"good");
    assert_eq!(recovered.read_bytes_named("BAD").unwrap(), None);
}

#[test]
fn open_rejects_garbage() {
    assert!(matches!(
        WadBuffer::from_bytes(b"GIF89a notawad"),
        Err(WadError::MalformedHeader(_))
    ));
    assert!(matches!(
        WadBuffer::from_bytes(b"PW"),
        Err(WadError::MalformedHeader(_))
    ));

    // Header whose directory points past the end of the file.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"PWAD");
    bytes.extend_from_slice(&2i32.to_le_bytes());
    bytes.extend_from_slice(&4096i32.to_le_bytes());
    assert!(matches!(
        WadBuffer::from_bytes(&bytes),
        Err(WadError::MalformedHeader(_))
    ));
}

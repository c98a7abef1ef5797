//! Property tests over fuzzed archives and directories

use proptest::prelude::*;
use wad_storage::{OpenMode, WadBuffer, WadError, WadKind};

fn lump_strategy() -> impl Strategy<Value = (String, Vec<u8>)> {
    ("[A-Z0-9_]{1,8}", prop::collection::vec(any::<u8>(), 0..64))
}

proptest! {
    /// Any mutation-free build sequence survives serialize-then-reopen with
    /// names, lengths, and contents intact.
    #[test]
    fn build_serialize_reopen(lumps in prop::collection::vec(lump_strategy(), 0..16)) {
        let mut wad = WadBuffer::new(WadKind::Pwad);
        for (name, data) in &lumps {
            wad.append(name, data).unwrap();
        }
        let bytes = wad.to_bytes().unwrap();

        let mut reopened = WadBuffer::from_bytes(&bytes).unwrap();
        prop_assert_eq!(reopened.entry_count(), lumps.len());
        for (index, (name, data)) in lumps.iter().enumerate() {
            let entry = *reopened.entry(index).unwrap();
            prop_assert!(entry.name.matches(name));
            prop_assert_eq!(entry.length as usize, data.len());
            // The core read invariant: exactly `length` bytes, no error.
            prop_assert_eq!(&reopened.read_bytes(index).unwrap(), data);
        }
    }

    /// Directories whose entries range outside the archive are rejected at
    /// open; best-effort open keeps exactly the in-bounds entries.
    #[test]
    fn out_of_range_directories_fail_eagerly(
        lumps in prop::collection::vec(lump_strategy(), 1..8),
        victim in any::<prop::sample::Index>(),
        extra in 1u32..0x100000,
    ) {
        let mut wad = WadBuffer::new(WadKind::Pwad);
        for (name, data) in &lumps {
            // Non-empty so the corrupted entry is never a marker.
            let mut data = data.clone();
            data.push(0);
            wad.append(name, &data).unwrap();
        }
        let mut bytes = wad.to_bytes().unwrap();
        let archive_len = bytes.len() as u32;

        let victim = victim.index(lumps.len());
        let dir_offset = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let record = dir_offset + victim * 16;
        // Point the victim entry past the end of the archive.
        bytes[record..record + 4].copy_from_slice(
            &((archive_len + extra) as i32).to_le_bytes(),
        );

        match WadBuffer::from_bytes(&bytes) {
            Err(WadError::CorruptDirectory { index, .. }) => prop_assert_eq!(index, victim),
            other => prop_assert!(false, "expected CorruptDirectory, got {:?}", other.map(|_| ())),
        }

        let recovered = WadBuffer::from_bytes_with(&bytes, OpenMode::BestEffort).unwrap();
        prop_assert_eq!(recovered.entry_count(), lumps.len() - 1);
    }

    /// Header fuzz: anything without a valid magic is rejected as malformed.
    #[test]
    fn bad_magic_is_malformed(mut bytes in prop::collection::vec(any::<u8>(), 12..64)) {
        prop_assume!(&bytes[0..4] != b"IWAD" && &bytes[0..4] != b"PWAD");
        let result = WadBuffer::from_bytes(&bytes);
        prop_assert!(matches!(result, Err(WadError::MalformedHeader(_))));
        bytes.truncate(11);
        prop_assert!(matches!(
            WadBuffer::from_bytes(&bytes),
            Err(WadError::MalformedHeader(_))
        ));
    }
}

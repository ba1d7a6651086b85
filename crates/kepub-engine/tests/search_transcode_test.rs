//! Key search and transcoding against an in-memory fixture book.

mod common;

use base64::{engine::general_purpose::STANDARD, Engine};
use common::*;
use kepub_archive::{ArchiveReader, MemoryArchive};
use kepub_core::KepubError;
use kepub_crypto::{derive_master_key, encrypt_ecb};
use kepub_engine::{find_master_key, select_probe_entry, transcode};
use proptest::prelude::*;

#[test]
fn search_returns_correct_seed_for_any_order() {
    let true_key = derive_master_key("S2", SERIAL, USER_ID);
    let (mut book, keys) = memory_book(&true_key, &sample_entries());
    let probe = select_probe_entry(&book.list_entries(), &keys).expect("probe entry");
    assert_eq!(probe.entry.name, "OEBPS/chapter1.html");

    let orders = [
        vec!["S1", "S2", "S3"],
        vec!["S2", "S3", "S1"],
        vec!["S3", "S1", "S2"],
        vec!["88b3a2e13", "XzUhGYdFp", "S2", "NoCanLook", "QJhwzAtXL"],
    ];
    for order in orders {
        let found = find_master_key(
            &strings(&[SERIAL]),
            USER_ID,
            &probe.entry.name,
            &probe.encrypted_key,
            &strings(&order),
            &mut book,
        )
        .expect("search should succeed");
        assert_eq!(found.seed, "S2", "order {order:?}");
        assert_eq!(found.master_key.as_bytes(), true_key.as_bytes());
    }
}

#[test]
fn search_without_correct_seed_is_exhausted() {
    let true_key = derive_master_key("S2", SERIAL, USER_ID);
    let (mut book, keys) = memory_book(&true_key, &sample_entries());

    let result = find_master_key(
        &strings(&[SERIAL, "N905B00000"]),
        USER_ID,
        "OEBPS/chapter1.html",
        &keys["OEBPS/chapter1.html"],
        &strings(&["S1", "S3", "S4"]),
        &mut book,
    );
    assert!(matches!(result, Err(KepubError::KeySearchExhausted { tried: 6 })));
}

#[test]
fn search_with_wrong_user_is_exhausted() {
    let true_key = derive_master_key("S2", SERIAL, USER_ID);
    let (mut book, keys) = memory_book(&true_key, &sample_entries());

    let result = find_master_key(
        &strings(&[SERIAL]),
        "someone-else",
        "OEBPS/chapter1.html",
        &keys["OEBPS/chapter1.html"],
        &strings(&["S1", "S2", "S3"]),
        &mut book,
    );
    assert!(matches!(result, Err(KepubError::KeySearchExhausted { tried: 3 })));
}

#[test]
fn transcode_fidelity() {
    let master = derive_master_key("S2", SERIAL, USER_ID);
    let entries = sample_entries();
    let (mut book, keys) = memory_book(&master, &entries);
    let mut out = MemoryArchive::new();

    let report = transcode(&mut book, &mut out, &master, &keys, None).unwrap();

    assert_eq!(report.decrypted, 4);
    assert_eq!(report.copied, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(out.names(), book.names());
    for e in &entries {
        let written = out.get(e.name).unwrap();
        if e.encrypted {
            assert_eq!(written, e.plaintext, "{} must decrypt to its plaintext", e.name);
        } else {
            assert_eq!(written, book.get(e.name).unwrap(), "{} must be byte-identical", e.name);
        }
    }
}

#[test]
fn transcode_isolates_truncated_key() {
    let master = derive_master_key("S2", SERIAL, USER_ID);
    let entries = sample_entries();
    let (mut book, mut keys) = memory_book(&master, &entries);

    let truncated = keys["OEBPS/chapter2.html"][..10].to_string();
    keys.insert("OEBPS/chapter2.html".into(), truncated);
    let mut out = MemoryArchive::new();

    let report = transcode(&mut book, &mut out, &master, &keys, None).unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.decrypted, 3);
    assert_eq!(report.failed_entries, vec!["OEBPS/chapter2.html".to_string()]);
    assert_eq!(out.get("OEBPS/chapter2.html").unwrap(), book.get("OEBPS/chapter2.html").unwrap());
    assert_eq!(out.get("OEBPS/chapter1.html").unwrap(), CHAPTER1);
    assert_eq!(out.get("OEBPS/images/cover.jpg").unwrap(), COVER);
}

#[test]
fn transcode_isolates_oversized_content_key() {
    let master = derive_master_key("S2", SERIAL, USER_ID);
    let (mut book, mut keys) = memory_book(&master, &sample_entries());

    // decrypts cleanly, but to a 32-byte key
    let wrapped = encrypt_ecb(&[7u8; 32], master.as_bytes()).unwrap();
    keys.insert("OEBPS/style.css".into(), STANDARD.encode(wrapped));
    let mut out = MemoryArchive::new();

    let report = transcode(&mut book, &mut out, &master, &keys, None).unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.failed_entries, vec!["OEBPS/style.css".to_string()]);
    assert_eq!(report.decrypted, 3);
}

proptest! {
    #[test]
    fn transcode_restores_arbitrary_payloads(
        payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..200), 1..6)
    ) {
        let master = derive_master_key("S1", SERIAL, USER_ID);
        let names = ["a.html", "b.xhtml", "c.jpg", "d.css", "e.opf"];
        let entries: Vec<Entry<'_>> = payloads
            .iter()
            .zip(names)
            .enumerate()
            .map(|(i, (p, name))| entry(name, p.as_slice(), i % 2 == 0))
            .collect();
        let (mut book, keys) = memory_book(&master, &entries);
        let mut out = MemoryArchive::new();

        let report = transcode(&mut book, &mut out, &master, &keys, None).unwrap();
        prop_assert_eq!(report.failed, 0);
        for e in &entries {
            prop_assert_eq!(out.get(e.name).unwrap(), e.plaintext);
        }
    }
}

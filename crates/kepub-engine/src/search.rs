//! Master-key search over the closed candidate set

use kepub_archive::ArchiveReader;
use kepub_core::{KepubError, KepubResult};
use kepub_crypto::MasterKey;
use tracing::{debug, info};

use crate::verify::{verify_payload, Candidate};

/// The accepted candidate and the key it derives
#[derive(Debug, Clone)]
pub struct KeyMatch {
    pub seed: String,
    pub serial: String,
    pub master_key: MasterKey,
}

/// Expand serials × seeds into search order: serials outer, seeds inner.
///
/// Repeated serials are tried once; seed order is kept as given. An empty
/// serial is a valid input and still derives a key.
pub fn candidates(serials: &[String], seeds: &[String]) -> Vec<Candidate> {
    let mut unique: Vec<&str> = Vec::with_capacity(serials.len());
    for serial in serials.iter().map(String::as_str) {
        if !unique.contains(&serial) {
            unique.push(serial);
        }
    }

    unique
        .into_iter()
        .flat_map(|serial| seeds.iter().map(move |seed| Candidate::new(seed.clone(), serial)))
        .collect()
}

/// Try candidates in order and return the first one `accept` yields a key for.
///
/// `accept` returns `Ok(None)` to move on; an `Err` aborts the search.
pub fn search<I, F>(candidates: I, mut accept: F) -> KepubResult<KeyMatch>
where
    I: IntoIterator<Item = Candidate>,
    F: FnMut(&Candidate) -> KepubResult<Option<MasterKey>>,
{
    let mut tried = 0usize;
    for candidate in candidates {
        tried += 1;
        if let Some(master_key) = accept(&candidate)? {
            info!(
                seed = %candidate.seed,
                serial = %candidate.serial,
                tried,
                "master key found"
            );
            return Ok(KeyMatch {
                seed: candidate.seed,
                serial: candidate.serial,
                master_key,
            });
        }
    }
    debug!(tried, "candidate set exhausted");
    Err(KepubError::KeySearchExhausted { tried })
}

/// Find the master key that opens `entry_id`.
///
/// The probe entry is read once and every candidate is checked against the
/// same bytes.
pub fn find_master_key<R: ArchiveReader + ?Sized>(
    serials: &[String],
    user_id: &str,
    entry_id: &str,
    encrypted_key_b64: &str,
    seeds: &[String],
    archive: &mut R,
) -> KepubResult<KeyMatch> {
    let payload = archive.read_entry_by_name(entry_id)?;
    debug!(entry = entry_id, bytes = payload.len(), "probe entry loaded");

    search(candidates(serials, seeds), |candidate| {
        Ok(verify_payload(candidate, user_id, encrypted_key_b64, &payload))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{build_book, SERIAL, USER_ID};
    use kepub_crypto::derive_master_key;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidates_order() {
        let got = candidates(&strings(&["A", "B"]), &strings(&["s1", "s2"]));
        assert_eq!(
            got,
            vec![
                Candidate::new("s1", "A"),
                Candidate::new("s2", "A"),
                Candidate::new("s1", "B"),
                Candidate::new("s2", "B"),
            ]
        );
    }

    #[test]
    fn test_candidates_dedup_serials() {
        let got = candidates(&strings(&["A", "A", "B", "A"]), &strings(&["s1"]));
        assert_eq!(got, vec![Candidate::new("s1", "A"), Candidate::new("s1", "B")]);
    }

    #[test]
    fn test_candidates_keep_empty_serial() {
        let got = candidates(&strings(&["", "B", ""]), &strings(&["s1"]));
        assert_eq!(got, vec![Candidate::new("s1", ""), Candidate::new("s1", "B")]);
    }

    #[test]
    fn test_search_stops_at_first_acceptance() {
        let mut calls = Vec::new();
        let found = search(candidates(&strings(&["X"]), &strings(&["a", "b", "c"])), |c| {
            calls.push(c.seed.clone());
            Ok((c.seed == "b").then(|| MasterKey::from_bytes([1u8; 16])))
        })
        .unwrap();

        assert_eq!(found.seed, "b");
        assert_eq!(calls, vec!["a", "b"], "search must stop after acceptance");
    }

    #[test]
    fn test_search_exhausted_reports_count() {
        let result = search(candidates(&strings(&["X", "Y"]), &strings(&["a", "b"])), |_| Ok(None));
        assert!(matches!(result, Err(KepubError::KeySearchExhausted { tried: 4 })));
    }

    #[test]
    fn test_search_propagates_errors() {
        let result = search(vec![Candidate::new("a", "X")], |_| {
            Err(KepubError::Archive("read failed".into()))
        });
        assert!(matches!(result, Err(KepubError::Archive(_))));
    }

    #[test]
    fn test_find_master_key_independent_of_order() {
        let true_key = derive_master_key("S2", SERIAL, USER_ID);
        let (mut archive, keys) = build_book(
            &true_key,
            &[("OEBPS/chapter1.html", b"<html><body>chapter</body></html>", true)],
        );
        let key_b64 = keys["OEBPS/chapter1.html"].clone();

        for seeds in [
            strings(&["S1", "S2", "S3"]),
            strings(&["S3", "S1", "S2"]),
            strings(&["S2"]),
            strings(&["S0", "S1", "S3", "S4", "S5", "S2"]),
        ] {
            let found = find_master_key(
                &strings(&[SERIAL]),
                USER_ID,
                "OEBPS/chapter1.html",
                &key_b64,
                &seeds,
                &mut archive,
            )
            .unwrap();
            assert_eq!(found.seed, "S2");
            assert_eq!(found.serial, SERIAL);
            assert_eq!(found.master_key.as_bytes(), true_key.as_bytes());
        }
    }

    #[test]
    fn test_find_master_key_tries_extra_serials() {
        let true_key = derive_master_key("S1", "N905B99999", USER_ID);
        let (mut archive, keys) =
            build_book(&true_key, &[("OEBPS/chapter1.html", b"<html>", true)]);

        let found = find_master_key(
            &strings(&[SERIAL, "N905B99999"]),
            USER_ID,
            "OEBPS/chapter1.html",
            &keys["OEBPS/chapter1.html"],
            &strings(&["S1", "S2"]),
            &mut archive,
        )
        .unwrap();
        assert_eq!(found.serial, "N905B99999");
    }

    #[test]
    fn test_find_master_key_with_empty_serial_and_user() {
        let true_key = derive_master_key("S3", "", "");
        let (mut archive, keys) =
            build_book(&true_key, &[("OEBPS/chapter1.html", b"<html>", true)]);

        let found = find_master_key(
            &strings(&[""]),
            "",
            "OEBPS/chapter1.html",
            &keys["OEBPS/chapter1.html"],
            &strings(&["S1", "S2", "S3"]),
            &mut archive,
        )
        .unwrap();
        assert_eq!(found.seed, "S3");
        assert_eq!(found.serial, "");
    }

    #[test]
    fn test_find_master_key_exhausted() {
        let true_key = derive_master_key("S2", SERIAL, USER_ID);
        let (mut archive, keys) =
            build_book(&true_key, &[("OEBPS/chapter1.html", b"<html>", true)]);

        let result = find_master_key(
            &strings(&[SERIAL]),
            USER_ID,
            "OEBPS/chapter1.html",
            &keys["OEBPS/chapter1.html"],
            &strings(&["S1", "S3"]),
            &mut archive,
        );
        assert!(matches!(result, Err(KepubError::KeySearchExhausted { tried: 2 })));
    }
}

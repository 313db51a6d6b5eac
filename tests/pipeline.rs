//! End-to-end checks of encode, verify and reconstruct through the public API.

use std::sync::Once;

use blobshare::{
    codec, init_with, reconstruct, take_last_error, validate_payload, Commitments, EncodedPayload,
    Encoder, EngineConfig, ResultCode, Share, Verifier, CHUNK_SIZE,
};

fn engine() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        init_with(EngineConfig {
            max_column_count: 32,
            ..EngineConfig::default()
        })
        .expect("engine init");
    });
}

fn payload(chunks: usize, salt: u8) -> Vec<u8> {
    (0..chunks * CHUNK_SIZE)
        .map(|i| (i as u8).wrapping_mul(17).wrapping_add(salt))
        .collect()
}

fn all_shares(columns: usize, data: &[u8]) -> Vec<Share> {
    let encoded = Encoder::new(columns).unwrap().encode(data).unwrap();
    (0..encoded.share_count())
        .map(|i| encoded.get_share(i).unwrap())
        .collect()
}

#[test]
fn encode_then_get_data_round_trips() {
    engine();
    for columns in [1, 2, 3, 4, 8] {
        for chunks in [1, 2, 5, 9] {
            let data = payload(chunks, columns as u8);
            let encoded = Encoder::new(columns).unwrap().encode(&data).unwrap();
            assert_eq!(encoded.get_data().unwrap(), data);
            assert_eq!(encoded.share_count(), columns);
        }
    }
}

#[test]
fn share_indices_cover_the_column_range() {
    engine();
    let encoded = Encoder::new(8).unwrap().encode(&payload(3, 1)).unwrap();
    for index in 0..8 {
        assert_eq!(encoded.get_share(index).unwrap().index(), index);
    }
    assert_eq!(
        encoded.get_share(8).unwrap_err().code(),
        ResultCode::InvalidInput
    );
    assert!(encoded.get_share(usize::MAX).is_err());
}

#[test]
fn every_share_verifies() {
    engine();
    let verifier = Verifier::new().unwrap();
    for columns in [2, 4, 8, 16] {
        let shares = all_shares(columns, &payload(6, 3));
        for share in &shares {
            assert!(verifier.verify(share, columns).unwrap());
        }
    }
}

#[test]
fn wrong_row_domain_size_fails_verification() {
    engine();
    let verifier = Verifier::new().unwrap();
    let shares = all_shares(8, &payload(4, 9));
    assert!(!verifier.verify(&shares[3], 16).unwrap());
    let detail = take_last_error().unwrap();
    assert!(detail.contains("share_idx: 3"), "{detail}");
    assert!(detail.contains("rows_domain_size: 16"), "{detail}");
}

#[test]
fn row_domain_size_must_equal_the_column_count() {
    engine();
    let verifier = Verifier::new().unwrap();
    let shares = all_shares(6, &payload(5, 2));
    assert!(verifier.verify(&shares[5], 6).unwrap());
    take_last_error();
    assert!(!verifier.verify(&shares[5], 7).unwrap());
    let detail = take_last_error().unwrap();
    assert!(detail.contains("rows_domain_size: 7"), "{detail}");
    assert!(!verifier.verify(&shares[0], 8).unwrap());
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn resources_are_send_and_sync() {
    assert_send_sync::<Encoder>();
    assert_send_sync::<EncodedPayload>();
    assert_send_sync::<Share>();
    assert_send_sync::<Commitments>();
    assert_send_sync::<Verifier>();
}

#[test]
fn encoders_run_concurrently() {
    engine();
    let narrow = Encoder::new(4).unwrap();
    let wide = Encoder::new(8).unwrap();
    let first = payload(7, 11);
    let second = payload(12, 23);
    let (a, b) = std::thread::scope(|scope| {
        let a = scope.spawn(|| narrow.encode(&first).unwrap());
        let b = scope.spawn(|| wide.encode(&second).unwrap());
        (a.join().unwrap(), b.join().unwrap())
    });
    assert_eq!(a.get_data().unwrap(), first);
    assert_eq!(b.get_data().unwrap(), second);

    let verifier = Verifier::new().unwrap();
    let a_shares: Vec<Share> = (2..4).map(|i| a.get_share(i).unwrap()).collect();
    let b_shares: Vec<Share> = (4..8).map(|i| b.get_share(i).unwrap()).collect();
    assert!(a_shares.iter().all(|s| verifier.verify(s, 4).unwrap()));
    assert!(b_shares.iter().all(|s| verifier.verify(s, 8).unwrap()));
    assert_eq!(reconstruct(&a_shares).unwrap(), first);
    assert_eq!(reconstruct(&b_shares).unwrap(), second);
}

#[test]
fn malformed_payloads_are_rejected_before_encoding() {
    engine();
    let encoder = Encoder::new(4).unwrap();
    for len in [0, 1, CHUNK_SIZE - 1, CHUNK_SIZE + 1, 3 * CHUNK_SIZE - 2] {
        let data = vec![5u8; len];
        let err = encoder.encode(&data).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidInput, "len={len}");
        assert!(validate_payload(&data).is_err());
    }
}

#[test]
fn reconstruction_is_complete_with_all_shares() {
    engine();
    for columns in [2, 4, 8] {
        for chunks in [1, 2, 4, 10] {
            let data = payload(chunks, 42);
            assert_eq!(reconstruct(&all_shares(columns, &data)).unwrap(), data);
        }
    }
}

#[test]
fn half_the_shares_are_enough() {
    engine();
    let data = payload(4, 7);
    let encoded = Encoder::new(4).unwrap().encode(&data).unwrap();
    let pairs = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    for (a, b) in pairs {
        let mut subset = vec![encoded.get_share(b).unwrap(), encoded.get_share(a).unwrap()];
        assert_eq!(reconstruct(&subset).unwrap(), data, "shares {a},{b}");
        subset.iter_mut().for_each(Share::release);
    }
    let single = [encoded.get_share(1).unwrap()];
    assert_eq!(
        reconstruct(&single).unwrap_err().code(),
        ResultCode::InvalidInput
    );
}

#[test]
fn shares_of_different_payloads_do_not_mix() {
    engine();
    let mut mixed = all_shares(4, &payload(4, 1));
    mixed.truncate(1);
    mixed.extend(all_shares(4, &payload(4, 2)).into_iter().skip(1));
    let err = reconstruct(&mixed).unwrap_err();
    assert!(err.is_invalid_input());
    assert!(err.to_string().starts_with("reconstruct: invalid input"));
}

#[test]
fn release_is_idempotent_everywhere() {
    engine();
    let mut encoder = Encoder::new(2).unwrap();
    let mut encoded = encoder.encode(&payload(1, 0)).unwrap();
    let mut share = encoded.get_share(1).unwrap();
    let mut commitments = share.commitments().unwrap();
    let mut verifier = Verifier::new().unwrap();

    for _ in 0..2 {
        encoder.release();
        encoded.release();
        share.release();
        commitments.release();
        verifier.release();
    }
    assert_eq!(encoded.share_count(), 0);
    assert_eq!(share.index(), 0);
    assert!(share.commitments().is_err());
    assert!(!encoder.is_live() && !verifier.is_live() && !commitments.is_live());

    let mut null = Share::null();
    null.release();
}

#[test]
fn wire_summary_matches_the_payload() {
    engine();
    let data = payload(3, 11);
    let encoded = Encoder::new(4).unwrap().encode(&data).unwrap();
    let bytes = codec::serialize_encoded_payload(&encoded).unwrap();
    let summary = codec::deserialize_payload_summary(&bytes).unwrap();
    assert_eq!(summary.data, data);
    assert_eq!(summary.share_count, 4);

    let share = encoded.get_share(3).unwrap();
    let index_bytes = codec::serialize_share_index(&share).unwrap();
    assert_eq!(codec::deserialize_share_index(&index_bytes).unwrap(), 3);
    assert!(codec::deserialize_payload_summary(&bytes[..bytes.len() - 1]).is_err());
    assert!(codec::serialize_share_index(&Share::null()).is_err());
}

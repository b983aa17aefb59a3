use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::env;
use veildata_ckks::{CkksContext, CkksError, CkksParams, DECRYPT_TOLERANCE};

fn small_params() -> CkksParams {
    CkksParams {
        poly_modulus_degree: 128,
        hamming_weight: 32,
        ..Default::default()
    }
}

fn assert_close(expected: &[f64], actual: &[f64]) {
    assert_eq!(expected.len(), actual.len());
    for (index, (e, a)) in expected.iter().zip(actual).enumerate() {
        assert!(
            (e - a).abs() < DECRYPT_TOLERANCE,
            "slot {index}: expected {e}, decrypted {a}"
        );
    }
}

fn random_column(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-50.0..50.0)).collect()
}

#[test]
fn round_trip_approximates_input() {
    let context = CkksContext::generate_seeded(small_params(), [3u8; 32]).expect("context");
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    for values in [
        vec![0.0],
        vec![1.0, -1.0, 3.5],
        random_column(100, 500),
    ] {
        let ciphertext = context.encrypt(&values, &mut rng).expect("encrypt");
        let decrypted = context.decrypt(&ciphertext).expect("decrypt");
        assert_close(&values, &decrypted);
    }
}

#[test]
fn scalar_addition_shifts_every_slot() {
    let context = CkksContext::generate_seeded(small_params(), [4u8; 32]).expect("context");
    let mut rng = ChaCha20Rng::seed_from_u64(12);
    let k = 5.0;
    for values in [
        vec![0.0],
        vec![1.0, -1.0, 3.5],
        random_column(100, 501),
    ] {
        let ciphertext = context.encrypt(&values, &mut rng).expect("encrypt");
        let shifted = context.add_plain_scalar(&ciphertext, k).expect("add");
        let decrypted = context.decrypt(&shifted).expect("decrypt");
        let expected: Vec<f64> = values.iter().map(|v| v + k).collect();
        assert_close(&expected, &decrypted);
    }
}

#[test]
fn repeated_scalar_additions_accumulate() {
    let context = CkksContext::generate_seeded(small_params(), [5u8; 32]).expect("context");
    let mut rng = ChaCha20Rng::seed_from_u64(13);
    let values = vec![10.0, -2.5, 0.75];
    let ciphertext = context.encrypt(&values, &mut rng).expect("encrypt");
    let once = context.add_plain_scalar(&ciphertext, 2.0).expect("add");
    let twice = context.add_plain_scalar(&once, -7.25).expect("add");
    let decrypted = context.decrypt(&twice).expect("decrypt");
    let expected: Vec<f64> = values.iter().map(|v| v + 2.0 - 7.25).collect();
    assert_close(&expected, &decrypted);
}

#[test]
fn foreign_ciphertext_is_rejected() {
    let alice = CkksContext::generate_seeded(small_params(), [6u8; 32]).expect("context");
    let bob = CkksContext::generate_seeded(small_params(), [7u8; 32]).expect("context");
    let mut rng = ChaCha20Rng::seed_from_u64(14);
    let ciphertext = alice.encrypt(&[1.0, 2.0], &mut rng).expect("encrypt");
    assert!(matches!(
        bob.decrypt(&ciphertext),
        Err(CkksError::ContextMismatch { .. })
    ));
    assert!(matches!(
        bob.add_plain_scalar(&ciphertext, 1.0),
        Err(CkksError::ContextMismatch { .. })
    ));
}

#[test]
fn public_context_encrypts_but_cannot_decrypt() {
    let full = CkksContext::generate_seeded(small_params(), [8u8; 32]).expect("context");
    let public = full.public_clone();
    assert!(!public.has_secret_key());
    assert_eq!(public.id(), full.id());

    let mut rng = ChaCha20Rng::seed_from_u64(15);
    let values = vec![4.0, -4.0];
    let ciphertext = public.encrypt(&values, &mut rng).expect("encrypt");
    let shifted = public.add_plain_scalar(&ciphertext, 1.5).expect("add");
    assert!(matches!(
        public.decrypt(&shifted),
        Err(CkksError::MissingSecretKey)
    ));

    // The full context still owns the secret and can finish the job.
    let decrypted = full.decrypt(&shifted).expect("decrypt");
    assert_close(&[5.5, -2.5], &decrypted);
}

#[test]
fn capacity_and_empty_input_are_rejected() {
    let context = CkksContext::generate_seeded(small_params(), [9u8; 32]).expect("context");
    assert_eq!(context.slot_capacity(), 128);
    let mut rng = ChaCha20Rng::seed_from_u64(16);
    assert!(matches!(
        context.encrypt(&[], &mut rng),
        Err(CkksError::EmptyInput)
    ));
    let oversized = vec![1.0; 129];
    assert!(matches!(
        context.encrypt(&oversized, &mut rng),
        Err(CkksError::CapacityExceeded { len: 129, capacity: 128 })
    ));
}

#[test]
fn default_parameters_round_trip() {
    if !allow_heavy_path() {
        return;
    }
    let context = CkksContext::generate_seeded(CkksParams::default(), [10u8; 32]).expect("context");
    let mut rng = ChaCha20Rng::seed_from_u64(17);
    let values = random_column(1000, 502);
    let ciphertext = context.encrypt(&values, &mut rng).expect("encrypt");
    let shifted = context.add_plain_scalar(&ciphertext, 5.0).expect("add");
    let decrypted = context.decrypt(&shifted).expect("decrypt");
    let expected: Vec<f64> = values.iter().map(|v| v + 5.0).collect();
    assert_close(&expected, &decrypted);
}

fn allow_heavy_path() -> bool {
    if env_flag_enabled("RUN_HEAVY_CKKS") {
        return true;
    }
    eprintln!("skipping default-parameter round trip (set RUN_HEAVY_CKKS=1 to run)");
    false
}

fn env_flag_enabled(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

use pathlock_core::{
    cipher, decapsulate, keypair, Puzzle, ENC_BYTES, HEADER_BYTES, IV_BYTES, KEM_CIPHERTEXT_BYTES,
    NONCE_BYTES, PUBLIC_KEY_BYTES, SECRET_KEY_BYTES, SOLUTION_BYTES,
};
use rand::RngCore;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

type MinedPuzzle = (
    Puzzle,
    Vec<u8>,
    Vec<u8>,
    [u8; PUBLIC_KEY_BYTES],
    [u8; SECRET_KEY_BYTES],
);

fn mined_puzzle() -> MinedPuzzle {
    let (pk, sk) = keypair();
    let header = random_bytes(HEADER_BYTES);
    let nonce = random_bytes(NONCE_BYTES);

    let mut puzzle = Puzzle::new();
    puzzle.initialize(&pk, &sk);
    puzzle.set_header(&header);
    puzzle.set_nonce(&nonce);
    assert!(puzzle.mine(), "mining must succeed for fresh keys");
    (puzzle, header, nonce, pk, sk)
}

#[test]
fn mine_roundtrip() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    assert_eq!(puzzle.solution.len(), SOLUTION_BYTES);
    assert!(puzzle.is_valid());

    let solution = puzzle.solution.as_bytes().to_vec();
    assert!(puzzle.validate(&solution));
}

#[test]
fn mine_roundtrip_parallel() {
    let (pk, sk) = keypair();
    let mut puzzle = Puzzle::new();
    puzzle.initialize(&pk, &sk);
    puzzle.enable_parallel_dfs();
    puzzle.set_header(&random_bytes(HEADER_BYTES));
    puzzle.set_nonce(&random_bytes(NONCE_BYTES));

    assert!(puzzle.mine());
    let solution = puzzle.solution.as_bytes().to_vec();
    assert!(puzzle.validate(&solution));
}

#[test]
fn cross_instance_validate() {
    let (puzzle_a, header, nonce, pk, sk) = mined_puzzle();
    let solution = puzzle_a.solution.as_bytes().to_vec();

    let mut puzzle_b = Puzzle::new();
    puzzle_b.initialize(&pk, &sk);
    puzzle_b.set_header(&header);
    puzzle_b.set_nonce(&nonce);
    assert!(puzzle_b.validate(&solution));
}

#[test]
fn solution_embeds_encrypted_preimage() {
    let (puzzle, header, nonce, _, sk) = mined_puzzle();
    let solution = puzzle.solution.as_bytes();

    let enc = &solution[..ENC_BYTES];
    let iv = &solution[ENC_BYTES..ENC_BYTES + IV_BYTES];
    let kem_ct: [u8; KEM_CIPHERTEXT_BYTES] = solution
        [ENC_BYTES + IV_BYTES..ENC_BYTES + IV_BYTES + KEM_CIPHERTEXT_BYTES]
        .try_into()
        .unwrap();

    let shared = decapsulate(&kem_ct, &sk).unwrap();
    let plaintext = cipher::decrypt(enc, &shared, iv).unwrap();

    let mut preimage = header.clone();
    preimage.extend_from_slice(&nonce);
    assert_eq!(plaintext, preimage);
}

#[test]
fn tampered_iv_rejected() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    let mut solution = puzzle.solution.as_bytes().to_vec();
    solution[ENC_BYTES + 3] ^= 0x20;
    assert!(!puzzle.validate(&solution));
}

#[test]
fn tampered_enc_rejected() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    let mut solution = puzzle.solution.as_bytes().to_vec();
    solution[7] ^= 0x01;
    assert!(!puzzle.validate(&solution));
}

#[test]
fn tampered_kem_ciphertext_rejected() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    let mut solution = puzzle.solution.as_bytes().to_vec();
    solution[ENC_BYTES + IV_BYTES + 100] ^= 0x80;
    assert!(!puzzle.validate(&solution));
}

#[test]
fn tampered_path_hash_rejected() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    let mut solution = puzzle.solution.as_bytes().to_vec();
    let last = solution.len() - 1;
    solution[last] ^= 0x01;
    assert!(!puzzle.validate(&solution));
}

#[test]
fn wrong_header_rejected() {
    let (mut puzzle, header, _, _, _) = mined_puzzle();
    let solution = puzzle.solution.as_bytes().to_vec();

    let mut other_header = header;
    other_header[0] ^= 0xFF;
    puzzle.set_header(&other_header);
    assert!(!puzzle.validate(&solution));
}

#[test]
fn wrong_keypair_rejected() {
    let (puzzle, header, nonce, _, _) = mined_puzzle();
    let solution = puzzle.solution.as_bytes().to_vec();

    let (other_pk, other_sk) = keypair();
    let mut stranger = Puzzle::new();
    stranger.initialize(&other_pk, &other_sk);
    stranger.set_header(&header);
    stranger.set_nonce(&nonce);
    assert!(!stranger.validate(&solution));
}

#[test]
fn truncated_solution_rejected() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    let solution = puzzle.solution.as_bytes().to_vec();
    assert!(!puzzle.validate(&solution[..SOLUTION_BYTES - 1]));
}

#[test]
fn validation_is_idempotent() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    let solution = puzzle.solution.as_bytes().to_vec();

    assert!(puzzle.validate(&solution));
    let first_graph_digest = puzzle.graph().hash();
    let first_path_digest = puzzle.path().hash();

    assert!(puzzle.validate(&solution));
    assert_eq!(puzzle.graph().hash(), first_graph_digest);
    assert_eq!(puzzle.path().hash(), first_path_digest);
}

#[test]
fn accessors_mirror_solution_layout() {
    let (puzzle, _, _, _, _) = mined_puzzle();
    let solution = puzzle.solution.as_bytes();

    assert_eq!(puzzle.graph().enc(), &solution[..ENC_BYTES]);
    assert_eq!(
        puzzle.graph().iv(),
        &solution[ENC_BYTES..ENC_BYTES + IV_BYTES]
    );
    assert_eq!(
        &puzzle.graph().kem_ciphertext()[..],
        &solution[ENC_BYTES + IV_BYTES..ENC_BYTES + IV_BYTES + KEM_CIPHERTEXT_BYTES]
    );
    assert_eq!(
        puzzle.path().hash(),
        solution[ENC_BYTES + IV_BYTES + KEM_CIPHERTEXT_BYTES..]
    );
}

#[test]
fn repeated_mines_stay_valid() {
    let (mut puzzle, _, _, _, _) = mined_puzzle();
    let first = puzzle.solution.as_bytes().to_vec();

    // Encapsulation is randomised, so a second mine of the same inputs
    // produces a different but equally valid solution.
    assert!(puzzle.mine());
    let second = puzzle.solution.as_bytes().to_vec();
    assert_ne!(first, second);
    assert!(puzzle.validate(&second));
    assert!(puzzle.validate(&first));
}

//! Property tests for request fingerprints.

use narrata_core::models::{ChatMessage, CompletionRequest};
use proptest::prelude::*;

fn request(system: &str, user: &str, temperature: f32) -> CompletionRequest {
    CompletionRequest::new(
        "gpt-4o-mini",
        vec![ChatMessage::system(system), ChatMessage::user(user)],
        temperature,
    )
}

proptest! {
    #[test]
    fn fingerprint_is_deterministic(
        system in ".{0,200}",
        user in ".{0,200}",
        temperature in 0.0f32..2.0,
    ) {
        let a = request(&system, &user, temperature);
        let b = request(&system, &user, temperature);
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn different_questions_get_different_fingerprints(
        a in "[a-z ]{1,80}",
        b in "[a-z ]{1,80}",
    ) {
        prop_assume!(a != b);
        let fa = request("schema", &a, 0.0).fingerprint();
        let fb = request("schema", &b, 0.0).fingerprint();
        prop_assert_ne!(fa, fb);
    }

    #[test]
    fn moving_text_between_messages_changes_fingerprint(
        left in "[a-z]{1,40}",
        right in "[a-z]{1,40}",
    ) {
        // Length prefixes keep "ab" + "c" apart from "a" + "bc".
        let joined = format!("{left}{right}");
        let split = request(&left, &right, 0.0).fingerprint();
        let shifted = request(&joined, "", 0.0).fingerprint();
        prop_assert_ne!(split, shifted);
    }

    #[test]
    fn retries_never_reuse_first_attempt_fingerprint(attempt in 1u32..50) {
        let base = request("s", "u", 0.0);
        prop_assert_ne!(base.clone().with_attempt(attempt).fingerprint(), base.fingerprint());
    }
}

//! Streaming fingerprint computation
//!
//! A call fingerprint is one SHA-256 pass over the code bytes, then the
//! argument bytes, then the environment bytes. The three sub-fingerprints
//! hash the same bytes on their own, which makes it possible to tell which
//! part of a call changed between two keys.

use crate::{Arguments, Code, Digest, Environment};
use sha2::{Digest as _, Sha256};

/// Incremental hasher over the parts of a call
#[derive(Clone, Default)]
pub struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    /// A fresh hash context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the code identity
    #[must_use]
    pub fn feed_code(mut self, code: &Code) -> Self {
        self.hasher.update(code.fingerprint_bytes());
        self
    }

    /// Feed the positional sequence, then the sorted keyword mapping
    #[must_use]
    pub fn feed_arguments(mut self, args: &Arguments) -> Self {
        self.hasher.update(args.canonical_positional().as_bytes());
        self.hasher.update(args.canonical_keywords().as_bytes());
        self
    }

    /// Feed the sorted non-locals, then the sorted globals
    #[must_use]
    pub fn feed_environment(mut self, env: &Environment) -> Self {
        self.hasher.update(env.canonical_nonlocals().as_bytes());
        self.hasher.update(env.canonical_globals().as_bytes());
        self
    }

    /// Finalize into a digest
    #[must_use]
    pub fn finish(self) -> Digest {
        Digest::from_bytes(self.hasher.finalize())
    }
}

impl std::fmt::Debug for Fingerprinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fingerprinter").finish_non_exhaustive()
    }
}

/// Fingerprint of a computation's code
#[must_use]
pub fn code_fingerprint(code: &Code) -> Digest {
    Fingerprinter::new().feed_code(code).finish()
}

/// Fingerprint of a call's arguments
#[must_use]
pub fn arg_fingerprint(args: &Arguments) -> Digest {
    Fingerprinter::new().feed_arguments(args).finish()
}

/// Fingerprint of a computation's captured environment
#[must_use]
pub fn env_fingerprint(env: &Environment) -> Digest {
    Fingerprinter::new().feed_environment(env).finish()
}

/// The cache key of a call: code, arguments and environment in one pass
#[must_use]
pub fn call_fingerprint(code: &Code, args: &Arguments, env: &Environment) -> Digest {
    let digest = Fingerprinter::new()
        .feed_code(code)
        .feed_arguments(args)
        .feed_environment(env)
        .finish();
    tracing::trace!(
        name = code.name(),
        code = %code_fingerprint(code),
        args = %arg_fingerprint(args),
        env = %env_fingerprint(env),
        key = %digest,
        "Computed call fingerprint"
    );
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use sha2::Digest as _;

    const SQUARE: &str = "fn f(x: i64) -> i64 {\n    x * x\n}\n";
    const SQUARE_PLUS_ONE: &str = "fn f(x: i64) -> i64 {\n    x * x + 1\n}\n";

    fn sha256_hex(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    // ==========================================================================
    // code_fingerprint tests
    // ==========================================================================

    #[test]
    fn test_code_fingerprint_is_sha256_of_significant_lines() {
        let code = Code::source("f", SQUARE);
        assert_eq!(
            code_fingerprint(&code).as_hex(),
            sha256_hex(b"fn f(x: i64) -> i64 {\n    x * x\n}\n")
        );
    }

    #[test]
    fn test_code_fingerprint_ignores_blank_lines() {
        let spaced = "\n\nfn f(x: i64) -> i64 {\n\n    x * x\n   \n}\n\n";
        assert_eq!(
            code_fingerprint(&Code::source("f", SQUARE)),
            code_fingerprint(&Code::source("f", spaced))
        );
    }

    #[test]
    fn test_code_fingerprint_changes_with_body() {
        assert_ne!(
            code_fingerprint(&Code::source("f", SQUARE)),
            code_fingerprint(&Code::source("f", SQUARE_PLUS_ONE))
        );
    }

    #[test]
    fn test_code_fingerprint_source_ignores_name() {
        // Identical source text means identical code, whatever it is called
        assert_eq!(
            code_fingerprint(&Code::source("f", SQUARE)),
            code_fingerprint(&Code::source("g", SQUARE))
        );
    }

    #[test]
    fn test_code_fingerprint_name_fallback() {
        let code = Code::named("std::f64::sqrt");
        assert_eq!(code_fingerprint(&code).as_hex(), sha256_hex(b"std::f64::sqrt"));
    }

    #[test]
    fn test_code_fingerprint_version_bump() {
        assert_ne!(
            code_fingerprint(&Code::versioned("rolx", "1")),
            code_fingerprint(&Code::versioned("rolx", "2"))
        );
    }

    // ==========================================================================
    // arg_fingerprint tests
    // ==========================================================================

    #[test]
    fn test_arg_fingerprint_keyword_order_invariant() {
        let ab = Arguments::new().kwarg("a", &1).unwrap().kwarg("b", &2).unwrap();
        let ba = Arguments::new().kwarg("b", &2).unwrap().kwarg("a", &1).unwrap();
        assert_eq!(arg_fingerprint(&ab), arg_fingerprint(&ba));
    }

    #[test]
    fn test_arg_fingerprint_positional_order_sensitive() {
        assert_ne!(
            arg_fingerprint(&args![1, 2].unwrap()),
            arg_fingerprint(&args![2, 1].unwrap())
        );
    }

    #[test]
    fn test_arg_fingerprint_keyword_presence_and_value() {
        let base = arg_fingerprint(&args![1; a = 1].unwrap());
        assert_ne!(base, arg_fingerprint(&args![1].unwrap()));
        assert_ne!(base, arg_fingerprint(&args![1; a = 2].unwrap()));
        assert_ne!(base, arg_fingerprint(&args![1; a = 1, b = 1].unwrap()));
    }

    #[test]
    fn test_arg_fingerprint_positional_vs_keyword() {
        assert_ne!(
            arg_fingerprint(&args![1].unwrap()),
            arg_fingerprint(&args![; a = 1].unwrap())
        );
    }

    // ==========================================================================
    // env_fingerprint tests
    // ==========================================================================

    #[test]
    fn test_env_fingerprint_depends_on_values_only() {
        // Two different computations capturing the same values
        let for_embed = Environment::new().nonlocal("k", &4).unwrap();
        let for_score = Environment::new().nonlocal("k", &4).unwrap();
        assert_eq!(env_fingerprint(&for_embed), env_fingerprint(&for_score));

        let changed = Environment::new().nonlocal("k", &5).unwrap();
        assert_ne!(env_fingerprint(&for_embed), env_fingerprint(&changed));
    }

    #[test]
    fn test_env_fingerprint_distinguishes_nonlocal_and_global() {
        let nonlocal = Environment::new().nonlocal("k", &4).unwrap();
        let global = Environment::new().global("k", &4).unwrap();
        assert_ne!(env_fingerprint(&nonlocal), env_fingerprint(&global));
    }

    #[test]
    fn test_env_fingerprint_capture_order_invariant() {
        let a = Environment::new()
            .global("x", &1)
            .unwrap()
            .global("y", &2)
            .unwrap();
        let b = Environment::new()
            .global("y", &2)
            .unwrap()
            .global("x", &1)
            .unwrap();
        assert_eq!(env_fingerprint(&a), env_fingerprint(&b));
    }

    // ==========================================================================
    // call_fingerprint tests
    // ==========================================================================

    #[test]
    fn test_call_fingerprint_is_single_pass() {
        let code = Code::source("f", SQUARE);
        let args = args![4; scale = 2].unwrap();
        let env = Environment::new().nonlocal("offset", &1).unwrap();

        let mut bytes = code.fingerprint_bytes();
        bytes.extend_from_slice(args.canonical_positional().as_bytes());
        bytes.extend_from_slice(args.canonical_keywords().as_bytes());
        bytes.extend_from_slice(env.canonical_nonlocals().as_bytes());
        bytes.extend_from_slice(env.canonical_globals().as_bytes());

        let key = call_fingerprint(&code, &args, &env);
        assert_eq!(key.as_hex(), sha256_hex(&bytes));

        // Not a hash of the concatenated sub-fingerprints
        let concatenated = format!(
            "{}{}{}",
            code_fingerprint(&code),
            arg_fingerprint(&args),
            env_fingerprint(&env)
        );
        assert_ne!(key.as_hex(), sha256_hex(concatenated.as_bytes()));
    }

    #[test]
    fn test_call_fingerprint_square_example() {
        let args = args![4].unwrap();
        let env = Environment::new();
        let square = Code::source("f", SQUARE);

        let first = call_fingerprint(&square, &args, &env);
        let second = call_fingerprint(&square, &args, &env);
        assert_eq!(first, second);

        let redefined = Code::source("f", SQUARE_PLUS_ONE);
        assert_ne!(first, call_fingerprint(&redefined, &args, &env));
    }

    #[test]
    fn test_call_fingerprint_sensitive_to_each_component() {
        let code = Code::source("f", SQUARE);
        let args = args![4].unwrap();
        let env = Environment::new().global("g", &1).unwrap();
        let base = call_fingerprint(&code, &args, &env);

        assert_ne!(
            base,
            call_fingerprint(&Code::source("f", SQUARE_PLUS_ONE), &args, &env)
        );
        assert_ne!(base, call_fingerprint(&code, &args![5].unwrap(), &env));
        assert_ne!(
            base,
            call_fingerprint(&code, &args, &Environment::new().global("g", &2).unwrap())
        );
    }

    #[test]
    fn test_fingerprint_is_stable_across_processes() {
        // Pinned value: a change here invalidates every existing store
        let key = call_fingerprint(&Code::named("f"), &Arguments::new(), &Environment::new());
        assert_eq!(key.as_hex(), sha256_hex(b"f[]{}{}{}"));
    }
}

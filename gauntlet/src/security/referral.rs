use rand::Rng;

const PREFIX: &str = "GL";
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// Generate a referral code: `GL` + 6 random uppercase alphanumerics.
///
/// Uniqueness is enforced by the ledger; callers retry with a fresh draw on conflict.
pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(PREFIX.len() + CODE_LEN);
    code.push_str(PREFIX);
    for _ in 0..CODE_LEN {
        let index = rng.gen_range(0..CODE_CHARS.len());
        code.push(CODE_CHARS[index] as char);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(code.starts_with("GL"));
        assert!(code[2..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}

use rand::Rng;

/// A fresh booking reference: `prefix` followed by six uppercase hex digits.
///
/// Uniqueness is left to the store's unique constraint; callers retry on conflict.
pub fn generate_reference(prefix: &str) -> String {
    let code: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("{}{:06X}", prefix, code)
}

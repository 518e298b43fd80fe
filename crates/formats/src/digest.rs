/// Content identity for loaded data files (blake3, lowercase hex).
///
/// Used to tell which snapshot of the region collection or a wage table a
/// process is serving.
pub fn content_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::content_digest;

    #[test]
    fn digest_is_stable_hex() {
        let a = content_digest(b"{\"CA|los angeles\":{}}");
        let b = content_digest(b"{\"CA|los angeles\":{}}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_digest(b"{}"));
    }
}

use rand::Rng;

/// Injectable source of cryptographically secure random bytes.
///
/// Request authenticators and Tunnel-Password salts are drawn from here, so
/// production implementations must be backed by a CSPRNG. Tests may inject a
/// deterministic provider.
pub trait RandomProvider: Send + Sync {
    fn fill_bytes(&self, buf: &mut [u8]);
}

/// Default provider backed by the operating system CSPRNG
#[derive(Debug, Default)]
pub struct SecureRandomProvider;

impl RandomProvider for SecureRandomProvider {
    fn fill_bytes(&self, buf: &mut [u8]) {
        let mut rng = rand::rng();
        rng.fill(buf);
    }
}

//! Ephemeral TLS configuration for the QUIC transport.
//!
//! QUIC requires TLS, but the specification doesn't mandate authenticated
//! cluster transport (§9 scopes cluster security as unaddressed). Rather
//! than require operators to provision certificates for an internal
//! protocol, each `NodeServer` generates a fresh self-signed certificate at
//! startup and each client connection skips server-certificate
//! verification. This is recorded as an explicit Open Question resolution
//! in DESIGN.md — it is not a silent shortcut.

use std::sync::Arc;

/// Generates a self-signed certificate/key pair for a `NodeServer` to
/// present on its QUIC endpoint.
pub fn generate_self_signed(subject_alt_name: &str) -> (rustls::Certificate, rustls::PrivateKey) {
    let cert = rcgen::generate_simple_self_signed(vec![subject_alt_name.to_string()])
        .expect("self-signed certificate generation cannot fail for a bare SAN");
    let cert_der = cert.serialize_der().expect("DER serialization of a freshly generated cert cannot fail");
    let key_der = cert.serialize_private_key_der();
    (rustls::Certificate(cert_der), rustls::PrivateKey(key_der))
}

/// Builds a `quinn::ServerConfig` around a freshly generated self-signed
/// certificate.
pub fn server_config(subject_alt_name: &str) -> quinn::ServerConfig {
    let (cert, key) = generate_self_signed(subject_alt_name);
    quinn::ServerConfig::with_single_cert(vec![cert], key)
        .expect("single-cert server config is always constructible from a valid cert/key pair")
}

/// Builds a `quinn::ClientConfig` that accepts any server certificate.
///
/// Appropriate for an internal cluster protocol where the threat model is
/// "buggy peer", not "hostile network" — see the module doc above.
pub fn insecure_client_config() -> quinn::ClientConfig {
    let crypto = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_custom_certificate_verifier(Arc::new(SkipServerVerification))
        .with_no_client_auth();
    quinn::ClientConfig::new(Arc::new(crypto))
}

struct SkipServerVerification;

impl rustls::client::ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}

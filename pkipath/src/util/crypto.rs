//! Default signature verification backend built on RustCrypto implementations
//!
//! Signature verification is reached through [`PkiEnvironment`] callbacks so that
//! deployments can substitute platform or hardware providers. The functions here
//! provide a default software provider covering RSA PKCS#1 v1.5 (SHA-256/384/512)
//! and ECDSA on P-256.

use der::asn1::ObjectIdentifier;
use der::Encode;
use log::error;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use p256::ecdsa::signature::Verifier as _;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use sha2::{Sha256, Sha384, Sha512};

use crate::environment::pki_environment::PkiEnvironment;
use crate::util::error::{Error, PathValidationStatus, Result};

/// sha256WithRSAEncryption from RFC 8017
pub const PKIXALG_SHA256_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
/// sha384WithRSAEncryption from RFC 8017
pub const PKIXALG_SHA384_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
/// sha512WithRSAEncryption from RFC 8017
pub const PKIXALG_SHA512_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
/// ecdsa-with-SHA256 from RFC 5758
pub const PKIXALG_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
/// secp256r1 named curve from RFC 5480
pub const PKIXALG_SECP256R1: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

fn is_rsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_SHA256_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA384_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA512_WITH_RSA_ENCRYPTION
}

fn verification_failed() -> Error {
    Error::PathValidation(PathValidationStatus::SignatureVerificationFailure)
}

fn verify_rsa(
    message: &[u8],
    signature: &[u8],
    signature_alg: &AlgorithmIdentifierOwned,
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    let enc_spki = spki.to_der()?;
    let rsa = RsaPublicKey::from_public_key_der(&enc_spki).map_err(|_| Error::Unrecognized)?;
    let sig =
        rsa::pkcs1v15::Signature::try_from(signature).map_err(|_| verification_failed())?;
    let result = match signature_alg.oid {
        PKIXALG_SHA256_WITH_RSA_ENCRYPTION => {
            rsa::pkcs1v15::VerifyingKey::<Sha256>::new(rsa).verify(message, &sig)
        }
        PKIXALG_SHA384_WITH_RSA_ENCRYPTION => {
            rsa::pkcs1v15::VerifyingKey::<Sha384>::new(rsa).verify(message, &sig)
        }
        PKIXALG_SHA512_WITH_RSA_ENCRYPTION => {
            rsa::pkcs1v15::VerifyingKey::<Sha512>::new(rsa).verify(message, &sig)
        }
        _ => return Err(Error::Unrecognized),
    };
    result.map_err(|_| verification_failed())
}

fn verify_p256(
    message: &[u8],
    signature: &[u8],
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    let named_curve = match &spki.algorithm.parameters {
        Some(params) => params
            .decode_as::<ObjectIdentifier>()
            .map_err(|_| Error::PathValidation(PathValidationStatus::EncodingError))?,
        None => return Err(Error::PathValidation(PathValidationStatus::EncodingError)),
    };
    if named_curve != PKIXALG_SECP256R1 {
        error!("Unrecognized or unsupported named curve: {}", named_curve);
        return Err(Error::Unrecognized);
    }
    let key_bytes = spki
        .subject_public_key
        .as_bytes()
        .ok_or(Error::PathValidation(PathValidationStatus::EncodingError))?;
    let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes)
        .map_err(|_| Error::Unrecognized)?;
    let sig = p256::ecdsa::Signature::from_der(signature).map_err(|_| verification_failed())?;
    vk.verify(message, &sig).map_err(|_| verification_failed())
}

/// `verify_signature_message_rust_crypto` implements the
/// [`VerifySignatureMessage`](crate::environment::pki_environment_traits::VerifySignatureMessage)
/// interface using RustCrypto implementations. RSA PKCS#1 v1.5 and ECDSA P-256
/// signatures are supported.
pub fn verify_signature_message_rust_crypto(
    _pe: &PkiEnvironment,
    message_to_verify: &[u8],
    signature: &[u8],
    signature_alg: &AlgorithmIdentifierOwned,
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    if is_rsa(&signature_alg.oid) {
        verify_rsa(message_to_verify, signature, signature_alg, spki)
    } else if signature_alg.oid == PKIXALG_ECDSA_WITH_SHA256 {
        verify_p256(message_to_verify, signature, spki)
    } else {
        error!("Unrecognized signature algorithm: {}", signature_alg.oid);
        Err(Error::Unrecognized)
    }
}

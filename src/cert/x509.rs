use crate::error::{Error, ErrorKind};
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1};
use der::asn1::{AnyRef, BitStringRef, IntRef};
use der::{Decode, Enumerated, Sequence};
use spki::{AlgorithmIdentifierRef, SubjectPublicKeyInfoRef};

/// X.509 certificates are defined in [RFC 5280 Section 4.1].
///
/// ```text
/// Certificate  ::=  SEQUENCE  {
///     tbsCertificate       TBSCertificate,
///     signatureAlgorithm   AlgorithmIdentifier,
///     signature            BIT STRING
/// }
/// ```
///
/// [RFC 5280 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct Certificate<'a> {
    pub tbs_certificate: TbsCertificate<'a>,
    pub signature_algorithm: AlgorithmIdentifierRef<'a>,
    pub signature: BitStringRef<'a>,
}

/// X.509 `TbsCertificate` as defined in [RFC 5280 Section 4.1]
///
/// Names, validity and extensions are kept as raw DER; only the fields the
/// device identity needs are decoded.
///
/// [RFC 5280 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct TbsCertificate<'a> {
    #[asn1(context_specific = "0", default = "Default::default")]
    pub version: Version,

    pub serial_number: IntRef<'a>,
    pub signature: AlgorithmIdentifierRef<'a>,
    pub issuer: AnyRef<'a>,
    pub validity: AnyRef<'a>,
    pub subject: AnyRef<'a>,
    pub subject_public_key_info: SubjectPublicKeyInfoRef<'a>,

    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub issuer_unique_id: Option<BitStringRef<'a>>,

    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", optional = "true")]
    pub subject_unique_id: Option<BitStringRef<'a>>,

    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", optional = "true")]
    pub extensions: Option<AnyRef<'a>>,
}

/// Certificate `Version` as defined in [RFC 5280 Section 4.1].
///
/// ```text
/// Version  ::=  INTEGER  {  v1(0), v2(1), v3(2)  }
/// ```
///
/// [RFC 5280 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1
#[derive(Clone, Debug, Copy, PartialEq, Eq, Enumerated)]
#[asn1(type = "INTEGER")]
#[repr(u8)]
pub enum Version {
    /// Version 1 (default)
    V1 = 0,

    /// Version 2
    V2 = 1,

    /// Version 3
    V3 = 2,
}

impl Default for Version {
    fn default() -> Self {
        Self::V1
    }
}

/// A certificate read out of the device, decoded in place.
#[derive(Clone, Debug)]
pub struct DeviceCertificate<'a> {
    der: &'a [u8],
    cert: Certificate<'a>,
}

impl<'a> DeviceCertificate<'a> {
    pub fn from_der(der: &'a [u8]) -> Result<Self, Error> {
        let cert = Certificate::from_der(der).map_err(|_e| {
            warn!("stored certificate is not valid DER");
            Error::from(ErrorKind::BadCertificate)
        })?;
        Ok(Self { der, cert })
    }

    pub fn as_der(&self) -> &'a [u8] {
        self.der
    }

    pub fn certificate(&self) -> &Certificate<'a> {
        &self.cert
    }

    pub fn version(&self) -> Version {
        self.cert.tbs_certificate.version
    }

    /// Big-endian serial number content octets.
    pub fn serial_number(&self) -> &'a [u8] {
        self.cert.tbs_certificate.serial_number.as_bytes()
    }

    /// DER content of the issuer `Name`.
    pub fn issuer(&self) -> &'a [u8] {
        self.cert.tbs_certificate.issuer.value()
    }

    /// DER content of the subject `Name`.
    pub fn subject(&self) -> &'a [u8] {
        self.cert.tbs_certificate.subject.value()
    }

    /// The device's P-256 public key.
    pub fn public_key(&self) -> Result<p256::PublicKey, Error> {
        let spki = &self.cert.tbs_certificate.subject_public_key_info;
        if spki.algorithm.oid != ID_EC_PUBLIC_KEY
            || spki.algorithm.parameters_oid().ok() != Some(SECP_256_R_1)
        {
            return Err(ErrorKind::BadCertificate.into());
        }
        let point = spki
            .subject_public_key
            .as_bytes()
            .ok_or(ErrorKind::BadCertificate)?;
        p256::PublicKey::from_sec1_bytes(point).map_err(|_| ErrorKind::BadCertificate.into())
    }

    /// PEM armored copy of the certificate, written into `out`.
    #[cfg(feature = "pem")]
    pub fn to_pem<'o>(&self, out: &'o mut [u8]) -> Result<&'o str, Error> {
        pem_rfc7468::encode(
            "CERTIFICATE",
            pem_rfc7468::LineEnding::LF,
            self.der,
            out,
        )
        .map_err(|_| ErrorKind::SmallBuffer.into())
    }
}

use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};

/// Per-image perceptual fingerprint plus a content digest of the raw bytes.
/// Both are computed once per image and cached for the whole run.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub perceptual: ImageHash,
    pub digest: [u8; 32],
}

/// Wraps an `image_hasher` Gradient (dHash) hasher at a fixed size.
pub struct FingerprintHasher {
    hasher: Hasher,
}

impl FingerprintHasher {
    pub fn new(hash_size: u32) -> Self {
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Gradient)
            .hash_size(hash_size, hash_size)
            .to_hasher();
        Self { hasher }
    }

    pub fn fingerprint(&self, image: &DynamicImage, bytes: &[u8]) -> Fingerprint {
        Fingerprint {
            perceptual: self.hasher.hash_image(image),
            digest: *blake3::hash(bytes).as_bytes(),
        }
    }
}

/// Hamming similarity between two fingerprints: `1 − distance / bit length`,
/// in [0, 1]. Fingerprints from the same hasher always have equal length.
pub fn similarity(a: &ImageHash, b: &ImageHash) -> f64 {
    let bits = (a.as_bytes().len() * 8) as f64;
    if bits == 0.0 {
        return 0.0;
    }
    1.0 - f64::from(a.dist(b)) / bits
}

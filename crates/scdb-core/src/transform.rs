//! Whole-payload byte transforms.
//!
//! A [`PayloadTransform`] wraps the finished byte stream on save and unwraps
//! it before decoding on load, once each. Encryption plugs in here; the
//! database never inspects key material or the sealed bytes.

use crate::error::TransformError;

/// A fallible, reversible transform over the whole encoded payload.
pub trait PayloadTransform {
    /// Wrap an encoded payload.
    fn seal(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransformError>;

    /// Unwrap a sealed payload.
    fn open(&self, sealed: Vec<u8>) -> Result<Vec<u8>, TransformError>;
}

/// Transform that leaves the payload untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plaintext;

impl PayloadTransform for Plaintext {
    fn seal(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        Ok(payload)
    }

    fn open(&self, sealed: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        Ok(sealed)
    }
}

impl<T: PayloadTransform + ?Sized> PayloadTransform for &T {
    fn seal(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        (**self).seal(payload)
    }

    fn open(&self, sealed: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        (**self).open(sealed)
    }
}

impl<T: PayloadTransform + ?Sized> PayloadTransform for Box<T> {
    fn seal(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        (**self).seal(payload)
    }

    fn open(&self, sealed: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        (**self).open(sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_is_identity() {
        let payload = vec![1, 2, 3];
        let sealed = Plaintext.seal(payload.clone()).unwrap();
        assert_eq!(sealed, payload);
        assert_eq!(Plaintext.open(sealed).unwrap(), payload);
    }

    #[test]
    fn test_boxed_transform() {
        let boxed: Box<dyn PayloadTransform> = Box::new(Plaintext);
        assert_eq!(boxed.seal(vec![9]).unwrap(), vec![9]);
    }
}

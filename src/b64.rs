//! This module contains basic base64 functionality as used in Hawk.  Every MAC, hash and
//! nonce on the wire uses the standard alphabet with padding.

pub(crate) fn encode<B: AsRef<[u8]>>(bytes: B) -> String {
    base64::encode_config(bytes.as_ref(), base64::STANDARD)
}

pub(crate) fn decode<S: AsRef<[u8]>>(value: S) -> Result<Vec<u8>, base64::DecodeError> {
    base64::decode_config(value.as_ref(), base64::STANDARD)
}

//! Inbound classification and the interface fingerprint used as a version
//! tag.

/// Classification of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<Req, Resp, Notif> {
	/// An incoming request.
	Request(Req),
	/// An incoming response.
	Response(Resp),
	/// An incoming notification.
	Notification(Notif),
}

/// Length of a version tag in bytes.
pub const TAG_LEN: usize = 16;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const HEX: &[u8; 16] = b"0123456789abcdef";

/// FNV-1a/64 of `definition`, rendered as 16 lowercase ASCII hex bytes.
///
/// Evaluated in const context so both sides of a connection embed the tag
/// of the interface they were built against.
#[must_use]
pub const fn fingerprint(definition: &str) -> [u8; TAG_LEN] {
	let bytes = definition.as_bytes();
	let mut hash = FNV_OFFSET;
	let mut i = 0;
	while i < bytes.len() {
		hash ^= bytes[i] as u64;
		hash = hash.wrapping_mul(FNV_PRIME);
		i += 1;
	}

	let mut out = [0u8; TAG_LEN];
	let mut j = 0;
	while j < TAG_LEN {
		let nibble = (hash >> ((TAG_LEN - 1 - j) * 4)) & 0xf;
		out[j] = HEX[nibble as usize];
		j += 1;
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fingerprint_matches_reference_fnv1a() {
		// FNV-1a/64 of the empty string is the offset basis.
		assert_eq!(&fingerprint(""), b"cbf29ce484222325");
		assert_eq!(&fingerprint("a"), b"af63dc4c8601ec8c");
	}

	#[test]
	fn fingerprint_differs_per_definition() {
		const A: [u8; TAG_LEN] = fingerprint("plugin.get_info() -> info");
		const B: [u8; TAG_LEN] = fingerprint("plugin.get_info() -> info2");
		assert_ne!(A, B);
		assert!(A.iter().all(u8::is_ascii_hexdigit));
	}
}

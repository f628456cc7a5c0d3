use uuid::Uuid;

/// Payload keys written by the ingestion pipeline for every chunk point.
pub mod payload_keys {
	pub const CHUNK_ID: &str = "chunk_id";
	pub const SOURCE: &str = "source";
	pub const CONTENT: &str = "content";
	pub const SOURCE_TYPE: &str = "source_type";
	pub const CHUNK_INDEX: &str = "chunk_index";
	pub const METADATA: &str = "metadata";
}

/// Stable chunk identifier derived from the source path and chunk position.
pub fn chunk_id(source: &str, chunk_index: i64) -> Uuid {
	let name = format!("{source} : {chunk_index}");

	Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chunk_id_is_stable_per_source_and_index() {
		let first = chunk_id("src/lib.rs", 3);

		assert_eq!(first, chunk_id("src/lib.rs", 3));
		assert_ne!(first, chunk_id("src/lib.rs", 4));
		assert_ne!(first, chunk_id("src/main.rs", 3));
	}
}

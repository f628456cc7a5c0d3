use std::collections::HashMap;

use qdrant_client::qdrant::{PointId, ScoredPoint, Value, point_id::PointIdOptions, value::Kind};
use sift_storage::models::{self, payload_keys};

use crate::types::{ChunkMetadata, IndexHit, SourceType};

/// Decodes points in order, skipping any that lack the fields a candidate needs.
pub fn decode_points(points: &[ScoredPoint]) -> Vec<IndexHit> {
	points.iter().filter_map(decode_point).collect()
}

fn decode_point(point: &ScoredPoint) -> Option<IndexHit> {
	let payload = &point.payload;
	let chunk_index = payload_i32(payload, payload_keys::CHUNK_INDEX);
	let source = payload_string(payload, payload_keys::SOURCE);
	let chunk_id = payload_string(payload, payload_keys::CHUNK_ID)
		.or_else(|| {
			let (source, index) = (source.as_deref()?, chunk_index?);

			Some(models::chunk_id(source, i64::from(index)).to_string())
		})
		.or_else(|| point.id.as_ref().and_then(point_id_to_string));
	let Some(chunk_id) = chunk_id else {
		tracing::warn!("Index hit missing chunk_id.");

		return None;
	};
	let Some(source_id) = source else {
		tracing::warn!(chunk_id = %chunk_id, "Index hit missing source.");

		return None;
	};
	let Some(text) = payload_string(payload, payload_keys::CONTENT) else {
		tracing::warn!(chunk_id = %chunk_id, "Index hit missing content.");

		return None;
	};
	let source_type = match payload_string(payload, payload_keys::SOURCE_TYPE)
		.map(|raw| raw.parse::<SourceType>())
	{
		Some(Ok(source_type)) => source_type,
		Some(Err(err)) => {
			tracing::warn!(chunk_id = %chunk_id, error = %err, "Index hit has unknown source_type.");

			return None;
		},
		None => {
			tracing::warn!(chunk_id = %chunk_id, "Index hit missing source_type.");

			return None;
		},
	};
	let mut metadata = payload_struct(payload, payload_keys::METADATA)
		.map(decode_metadata)
		.unwrap_or_default();

	metadata.chunk_index = metadata.chunk_index.or(chunk_index);

	Some(IndexHit { chunk_id, source_id, text, source_type, score: point.score, metadata })
}

fn decode_metadata(fields: &HashMap<String, Value>) -> ChunkMetadata {
	ChunkMetadata {
		chunk_index: payload_i32(fields, "chunk_index"),
		page_number: payload_i32(fields, "page_number"),
		function_name: payload_string(fields, "function_name"),
		class_name: payload_string(fields, "class_name"),
		section_title: payload_string(fields, "section_title"),
		start_line: payload_i32(fields, "start_line"),
		end_line: payload_i32(fields, "end_line"),
		header_level: payload_i32(fields, "header_level"),
		element_type: payload_string(fields, "element_type"),
	}
}

fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.to_string()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

fn payload_i32(payload: &HashMap<String, Value>, key: &str) -> Option<i32> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => i32::try_from(*value).ok(),
		Some(Kind::DoubleValue(value)) =>
			if value.fract() == 0.0 {
				i32::try_from(*value as i64).ok()
			} else {
				None
			},
		_ => None,
	}
}

fn payload_struct<'a>(
	payload: &'a HashMap<String, Value>,
	key: &str,
) -> Option<&'a HashMap<String, Value>> {
	match &payload.get(key)?.kind {
		Some(Kind::StructValue(inner)) => Some(&inner.fields),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::Struct;

	use super::*;

	fn point(id: u64, score: f32, fields: &[(&str, Value)]) -> ScoredPoint {
		ScoredPoint {
			id: Some(PointId::from(id)),
			payload: fields.iter().map(|(key, value)| (key.to_string(), value.clone())).collect(),
			score,
			..Default::default()
		}
	}

	fn base_fields() -> Vec<(&'static str, Value)> {
		vec![
			("chunk_id", Value::from("c-1")),
			("source", Value::from("src/config.rs")),
			("content", Value::from("fn load() {}")),
			("source_type", Value::from("code")),
		]
	}

	#[test]
	fn decodes_required_fields_and_metadata() {
		let mut fields = base_fields();
		let metadata = Struct {
			fields: [
				("function_name".to_string(), Value::from("load")),
				("start_line".to_string(), Value::from(12_i64)),
				("end_line".to_string(), Value::from(20.0_f64)),
			]
			.into_iter()
			.collect(),
		};

		fields.push(("chunk_index", Value::from(4_i64)));
		fields.push(("metadata", Value { kind: Some(Kind::StructValue(metadata)) }));

		let hits = decode_points(&[point(7, 0.8, &fields)]);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].chunk_id, "c-1");
		assert_eq!(hits[0].source_type, SourceType::Code);
		assert_eq!(hits[0].score, 0.8);
		assert_eq!(hits[0].metadata.function_name.as_deref(), Some("load"));
		assert_eq!(hits[0].metadata.start_line, Some(12));
		assert_eq!(hits[0].metadata.end_line, Some(20));
		assert_eq!(hits[0].metadata.chunk_index, Some(4));
	}

	#[test]
	fn derives_chunk_id_from_source_and_index() {
		let mut fields: Vec<_> =
			base_fields().into_iter().filter(|(key, _)| *key != "chunk_id").collect();

		fields.push(("chunk_index", Value::from(2_i64)));

		let hits = decode_points(&[point(7, 0.5, &fields)]);

		assert_eq!(hits[0].chunk_id, models::chunk_id("src/config.rs", 2).to_string());
	}

	#[test]
	fn falls_back_to_point_id() {
		let fields: Vec<_> =
			base_fields().into_iter().filter(|(key, _)| *key != "chunk_id").collect();
		let hits = decode_points(&[point(42, 0.5, &fields)]);

		assert_eq!(hits[0].chunk_id, "42");
	}

	#[test]
	fn skips_points_missing_content_or_with_unknown_type() {
		let without_content: Vec<_> =
			base_fields().into_iter().filter(|(key, _)| *key != "content").collect();
		let mut unknown_type = base_fields();

		unknown_type.retain(|(key, _)| *key != "source_type");
		unknown_type.push(("source_type", Value::from("spreadsheet")));

		let hits = decode_points(&[
			point(1, 0.9, &without_content),
			point(2, 0.8, &unknown_type),
			point(3, 0.7, &base_fields()),
		]);

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].score, 0.7);
	}
}

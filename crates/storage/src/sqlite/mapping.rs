use chrono::{DateTime, Utc};
use quiz_core::model::{
    Level, LevelRecord, PlayerId, Question, QuestionDraft, QuestionId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    u64_to_i64("question_id", id.value())
}

pub(crate) fn player_id_to_i64(id: PlayerId) -> Result<i64, StorageError> {
    u64_to_i64("player_id", id.value())
}

pub(crate) fn level_from_i64(v: i64) -> Result<Level, StorageError> {
    let raw = u32::try_from(v).map_err(|_| ser(format!("invalid level: {v}")))?;
    Level::new(raw).map_err(ser)
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Question ids are kept as a JSON array to preserve draw order.
pub(crate) fn encode_ids(ids: &[QuestionId]) -> Result<String, StorageError> {
    serde_json::to_string(ids).map_err(ser)
}

pub(crate) fn decode_ids(raw: &str) -> Result<Vec<QuestionId>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let choices_raw: String = row.try_get("choices").map_err(ser)?;
    let choices: Vec<String> = serde_json::from_str(&choices_raw).map_err(ser)?;
    let correct_raw: i64 = row.try_get("correct_choice").map_err(ser)?;
    let correct_choice = usize::try_from(correct_raw)
        .map_err(|_| ser(format!("invalid correct_choice: {correct_raw}")))?;

    QuestionDraft {
        prompt: row.try_get("prompt").map_err(ser)?,
        choices,
        correct_choice,
        reference: row.try_get("reference").map_err(ser)?,
    }
    .validate(id)
    .map_err(ser)
}

pub(crate) fn map_level_row(row: &sqlx::sqlite::SqliteRow) -> Result<LevelRecord, StorageError> {
    let level = level_from_i64(row.try_get("level").map_err(ser)?)?;
    let ids_raw: String = row.try_get("question_ids").map_err(ser)?;
    let requested = u32_from_i64("requested", row.try_get("requested").map_err(ser)?)?;
    let correct = row
        .try_get::<Option<i64>, _>("correct")
        .map_err(ser)?
        .map(|v| u32_from_i64("correct", v))
        .transpose()?;
    let drawn_at: DateTime<Utc> = row.try_get("drawn_at").map_err(ser)?;

    Ok(LevelRecord::from_persisted(
        level,
        decode_ids(&ids_raw)?,
        requested,
        correct,
        drawn_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_keep_draw_order() {
        let ids = vec![QuestionId::new(9), QuestionId::new(2), QuestionId::new(5)];
        let raw = encode_ids(&ids).unwrap();
        assert_eq!(raw, "[9,2,5]");
        assert_eq!(decode_ids(&raw).unwrap(), ids);
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(question_id_from_i64(-1).is_err());
        assert!(level_from_i64(0).is_err());
        assert!(u32_from_i64("correct", -2).is_err());
    }
}

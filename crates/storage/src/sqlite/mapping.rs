use quiz_core::model::{ImageRef, LevelId, ProgressStatus, QuestionId, UserId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn level_id_from_i64(v: i64) -> Result<LevelId, StorageError> {
    Ok(LevelId::new(i64_to_u64("level_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn ordinal_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization("ordinal overflow".into()))
}

pub(crate) fn score_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization("high_score overflow".into()))
}

pub(crate) fn user_id_from_str(s: &str) -> Result<UserId, StorageError> {
    s.parse::<UserId>()
        .map_err(|_| StorageError::Serialization(format!("invalid user_id: {s}")))
}

pub(crate) fn status_from_i64(v: i64) -> Result<ProgressStatus, StorageError> {
    ProgressStatus::from_code(v).map_err(ser)
}

/// Image references persist as a single nullable text column; URLs keep
/// their scheme, file paths do not.
pub(crate) fn image_ref_to_string(image: Option<&ImageRef>) -> Option<String> {
    image.map(|i| match i {
        ImageRef::FilePath(p) => p.display().to_string(),
        ImageRef::Url(u) => u.to_string(),
    })
}

pub(crate) fn image_ref_from_string(s: Option<String>) -> Result<Option<ImageRef>, StorageError> {
    let Some(s) = s else {
        return Ok(None);
    };
    let image = if s.contains("://") {
        ImageRef::from_url(&s).map_err(ser)?
    } else {
        ImageRef::from_file(&s).map_err(ser)?
    };
    Ok(Some(image))
}

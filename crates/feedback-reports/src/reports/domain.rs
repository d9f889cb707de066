use serde::{Deserialize, Deserializer, Serialize};

/// Structured result returned by the processing service for one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(default, deserialize_with = "list_or_null")]
    pub students: Vec<StudentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EvaluationResult {
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Result-level notes when they carry visible text.
    pub fn general_notes(&self) -> Option<&str> {
        non_blank(self.notes.as_deref())
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Feedback for one student across both competencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(rename = "matricula", default, deserialize_with = "string_or_null")]
    pub id: String,
    #[serde(
        rename = "summary_fuentes_datos_segura",
        default,
        deserialize_with = "string_or_null"
    )]
    pub summary_a: String,
    #[serde(
        rename = "summary_trabajo_en_equipo",
        default,
        deserialize_with = "string_or_null"
    )]
    pub summary_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl StudentRecord {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_summaries(mut self, summary_a: impl Into<String>, summary_b: impl Into<String>) -> Self {
        self.summary_a = summary_a.into();
        self.summary_b = summary_b.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Header line shown above the student's sections.
    pub fn heading(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }

    /// Student notes when they carry visible text. Absent and blank are equivalent.
    pub fn note(&self) -> Option<&str> {
        non_blank(self.notes.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn list_or_null<'de, D>(deserializer: D) -> Result<Vec<StudentRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<StudentRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

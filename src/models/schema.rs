//! Field-schema descriptors for the record types the console manages.
//!
//! Student and Faculty share every list and panel code path; only the
//! descriptors below differ.

use std::fmt;

/// Semantic type of a field, deciding which inline editor it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// `YYYY-MM-DD`
    Date,
    Enum(&'static [&'static str]),
}

/// One editable field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub searchable: bool,
    pub required: bool,
}

impl FieldSpec {
    const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            searchable: false,
            required: false,
        }
    }

    const fn date(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Date,
            ..Self::text(name, label)
        }
    }

    const fn choice(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            kind: FieldKind::Enum(options),
            ..Self::text(name, label)
        }
    }

    const fn searchable(self) -> Self {
        Self {
            searchable: true,
            ..self
        }
    }

    const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }
}

/// Record collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Students,
    Faculty,
}

impl Entity {
    pub const ALL: [Entity; 2] = [Entity::Students, Entity::Faculty];

    /// REST collection path, e.g. `/api/students`.
    pub fn collection_path(&self) -> &'static str {
        match self {
            Entity::Students => "/api/students",
            Entity::Faculty => "/api/faculty",
        }
    }

    /// REST item path, e.g. `/api/students/7`.
    pub fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.collection_path(), id)
    }

    pub fn schema(&self) -> &'static EntitySchema {
        match self {
            Entity::Students => &STUDENT_SCHEMA,
            Entity::Faculty => &FACULTY_SCHEMA,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "student" | "students" => Some(Entity::Students),
            "faculty" => Some(Entity::Faculty),
            _ => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Students => write!(f, "students"),
            Entity::Faculty => write!(f, "faculty"),
        }
    }
}

/// Field layout of one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    pub entity: Entity,
    /// Singular display name
    pub noun: &'static str,
    /// Human-facing identifier field, editable unlike `id`
    pub identifier: &'static str,
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn searchable(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.searchable)
    }
}

pub const STATUS_FIELD: &str = "status";
pub const ARCHIVED_AT_FIELD: &str = "archived_at";
pub const ARCHIVED_STATUS: &str = "archived";

const GENDERS: &[&str] = &["Male", "Female", "Other"];

const PROGRAMS: &[&str] = &[
    "Nursing Program",
    "Engineering Program",
    "Computer Science Program",
    "Business Administration Program",
    "Education Program",
    "Arts and Sciences Program",
];

const YEAR_LEVELS: &[&str] = &["1st Year", "2nd Year", "3rd Year", "4th Year", "5th Year"];

const STUDENT_STATUSES: &[&str] = &["Active", "Inactive", "Graduated", "On Leave"];

const DEPARTMENTS: &[&str] = &[
    "Nursing",
    "Engineering",
    "Computer Science",
    "Business Administration",
    "Education",
    "Arts and Sciences",
];

const POSITIONS: &[&str] = &[
    "Instructor",
    "Assistant Professor",
    "Associate Professor",
    "Professor",
    "Department Head",
];

const FACULTY_STATUSES: &[&str] = &["Active", "On Leave", "Retired"];

pub static STUDENT_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Students,
    noun: "student",
    identifier: "student_id",
    fields: &[
        FieldSpec::text("student_id", "Student ID").searchable().required(),
        FieldSpec::text("first_name", "First Name").searchable().required(),
        FieldSpec::text("middle_name", "Middle Name"),
        FieldSpec::text("last_name", "Last Name").searchable().required(),
        FieldSpec::text("email", "Email").searchable().required(),
        FieldSpec::text("phone", "Phone"),
        FieldSpec::date("date_of_birth", "Date of Birth"),
        FieldSpec::choice("gender", "Gender", GENDERS),
        FieldSpec::text("address", "Address"),
        FieldSpec::choice("program", "Program", PROGRAMS).searchable().required(),
        FieldSpec::choice("year_level", "Year Level", YEAR_LEVELS),
        FieldSpec::date("enrollment_date", "Enrollment Date"),
        FieldSpec::choice(STATUS_FIELD, "Status", STUDENT_STATUSES),
    ],
};

pub static FACULTY_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Faculty,
    noun: "faculty member",
    identifier: "faculty_id",
    fields: &[
        FieldSpec::text("faculty_id", "Faculty ID").searchable().required(),
        FieldSpec::text("first_name", "First Name").searchable().required(),
        FieldSpec::text("middle_name", "Middle Name"),
        FieldSpec::text("last_name", "Last Name").searchable().required(),
        FieldSpec::text("email", "Email").searchable().required(),
        FieldSpec::text("phone", "Phone"),
        FieldSpec::choice("department", "Department", DEPARTMENTS)
            .searchable()
            .required(),
        FieldSpec::choice("position", "Position", POSITIONS),
        FieldSpec::date("hire_date", "Hire Date"),
        FieldSpec::text("office", "Office"),
        FieldSpec::choice(STATUS_FIELD, "Status", FACULTY_STATUSES),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_searchable_fields() {
        let names: Vec<_> = STUDENT_SCHEMA.searchable().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["student_id", "first_name", "last_name", "email", "program"]
        );

        let names: Vec<_> = FACULTY_SCHEMA.searchable().map(|f| f.name).collect();
        assert!(names.contains(&"department"));
        assert!(names.contains(&"faculty_id"));
    }

    #[test]
    fn test_entity_paths() {
        assert_eq!(Entity::Students.collection_path(), "/api/students");
        assert_eq!(Entity::Faculty.item_path(3), "/api/faculty/3");
        assert_eq!(Entity::from_str("Student"), Some(Entity::Students));
        assert_eq!(Entity::from_str("teachers"), None);
    }

    #[test]
    fn test_field_lookup() {
        let program = STUDENT_SCHEMA.field("program").unwrap();
        assert!(matches!(program.kind, FieldKind::Enum(opts) if opts.contains(&"Nursing Program")));
        assert!(STUDENT_SCHEMA.field("department").is_none());
        assert_eq!(Entity::Faculty.schema().identifier, "faculty_id");
    }
}

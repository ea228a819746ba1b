//! Catalog identifiers
//!
//! Catalog CRUD lives elsewhere; the access-control core only needs to name
//! courses and lessons.

uuid_id!(
    /// Unique course identifier
    CourseId
);

uuid_id!(
    /// Unique lesson identifier
    LessonId
);

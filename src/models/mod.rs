pub mod course;
pub mod student;

pub use course::{Course, CourseForm};
pub use student::{NewStudent, Student, StudentForm};

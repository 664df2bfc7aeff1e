pub mod conditioning;
pub mod interfaces;
pub mod model;
pub mod planning;
pub mod recovery;
pub mod scene;
pub mod synthesis;

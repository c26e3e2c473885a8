pub mod factors;
pub mod recipient;
pub mod report;
pub mod scoring;
pub mod weights;

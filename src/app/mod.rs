// Application layer: one pipeline per snapshot job.

pub mod jobs;

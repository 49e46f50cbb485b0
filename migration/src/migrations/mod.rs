pub mod m202608070001_create_activities;
pub mod m202608070002_create_submissions;

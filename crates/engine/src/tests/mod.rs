mod helpers;

mod level_tests;

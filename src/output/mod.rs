// Output formatting: colored terminal display for each pipeline stage.

pub mod terminal;

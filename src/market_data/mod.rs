// Market data module entrypoint
pub mod adapters;   // upstream-specific fetchers (Yahoo, TWSE, section-based)
pub mod normaliser; // converts wire values -> prices

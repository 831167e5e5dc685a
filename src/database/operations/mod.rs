pub mod arrest_rate;
pub mod facility;

pub use arrest_rate::PgArrestRateTable;
pub use facility::{FacilityStore, PgFacilityStore, StoreError};

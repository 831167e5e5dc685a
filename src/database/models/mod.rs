pub mod arrest_rate;
pub mod facility;

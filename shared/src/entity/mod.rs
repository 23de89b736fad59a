pub mod prices;
pub mod stocks;

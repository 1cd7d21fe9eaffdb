//! Fixed vehicle catalogue the generator draws from.

use crate::seed::FuelSeed;

/// One catalogue entry: manufacturer, world manufacturer identifier, model
/// and fuel type.
pub(crate) struct CatalogueModel {
    pub make: &'static str,
    pub wmi: &'static str,
    pub model: &'static str,
    pub fuel: FuelSeed,
}

const fn entry(
    make: &'static str,
    wmi: &'static str,
    model: &'static str,
    fuel: FuelSeed,
) -> CatalogueModel {
    CatalogueModel {
        make,
        wmi,
        model,
        fuel,
    }
}

pub(crate) const MODELS: &[CatalogueModel] = &[
    entry("Toyota", "JTD", "Corolla", FuelSeed::Gasoline),
    entry("Toyota", "JTD", "Prius", FuelSeed::Hybrid),
    entry("Toyota", "4T1", "Camry", FuelSeed::Gasoline),
    entry("Honda", "1HG", "Civic", FuelSeed::Gasoline),
    entry("Honda", "1HG", "Accord", FuelSeed::Gasoline),
    entry("Ford", "1FA", "Focus", FuelSeed::Gasoline),
    entry("Ford", "1FT", "F-150", FuelSeed::Gasoline),
    entry("Ford", "1FT", "Transit", FuelSeed::Diesel),
    entry("Chevrolet", "1G1", "Malibu", FuelSeed::Gasoline),
    entry("Chevrolet", "1G1", "Bolt", FuelSeed::Electric),
    entry("Nissan", "1N4", "Altima", FuelSeed::Gasoline),
    entry("Nissan", "1N4", "Leaf", FuelSeed::Electric),
    entry("Subaru", "JF1", "Outback", FuelSeed::Gasoline),
    entry("Hyundai", "KMH", "Elantra", FuelSeed::Gasoline),
    entry("Volkswagen", "WVW", "Golf", FuelSeed::Diesel),
    entry("BMW", "WBA", "330i", FuelSeed::Gasoline),
    entry("Tesla", "5YJ", "Model 3", FuelSeed::Electric),
];

pub(crate) const COLORS: &[&str] = &[
    "Black", "White", "Silver", "Grey", "Blue", "Red", "Green", "Beige",
];

/// Oldest model year generated.
pub(crate) const OLDEST_YEAR: i32 = 2005;

/// Newest model year generated.
pub(crate) const NEWEST_YEAR: i32 = 2024;

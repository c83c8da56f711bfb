//! Cargo units and the factory that builds them

use serde::{Deserialize, Serialize};

use crate::platform::{TextureHandle, TextureLookup};

/// Commodity carried between ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CargoType {
    Oil,
    Gas,
    Food,
}

impl CargoType {
    pub const ALL: [CargoType; 3] = [CargoType::Oil, CargoType::Gas, CargoType::Food];

    /// Stable position in [`CargoType::ALL`]
    pub fn index(self) -> usize {
        match self {
            CargoType::Oil => 0,
            CargoType::Gas => 1,
            CargoType::Food => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CargoType::Oil => "Oil",
            CargoType::Gas => "Gas",
            CargoType::Food => "Food",
        }
    }
}

/// One unit of cargo, sitting either in a port buffer or a ship hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cargo {
    pub kind: CargoType,
    pub texture: TextureHandle,
}

type CargoBuilder = fn(&dyn TextureLookup) -> Cargo;

fn build_oil(textures: &dyn TextureLookup) -> Cargo {
    Cargo {
        kind: CargoType::Oil,
        texture: textures.cargo_texture(CargoType::Oil, false),
    }
}

fn build_gas(textures: &dyn TextureLookup) -> Cargo {
    Cargo {
        kind: CargoType::Gas,
        texture: textures.cargo_texture(CargoType::Gas, false),
    }
}

fn build_food(textures: &dyn TextureLookup) -> Cargo {
    Cargo {
        kind: CargoType::Food,
        texture: textures.cargo_texture(CargoType::Food, false),
    }
}

/// Builder table keyed by [`CargoType::index`]
#[derive(Clone, Copy)]
pub struct CargoFactory {
    builders: [CargoBuilder; 3],
}

impl std::fmt::Debug for CargoFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CargoFactory").finish_non_exhaustive()
    }
}

impl Default for CargoFactory {
    fn default() -> Self {
        Self {
            builders: [build_oil, build_gas, build_food],
        }
    }
}

impl CargoFactory {
    pub fn make(&self, kind: CargoType, textures: &dyn TextureLookup) -> Cargo {
        (self.builders[kind.index()])(textures)
    }
}

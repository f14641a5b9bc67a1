use crate::{reader::BinaryReader, Result};

/// The broad creature class of a mob, used to pick valid weapon effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobType {
    Animal,
    Mutant,
    Humanoid,
    Cyborg,
    Robot,
    Unknown(u8),
}

impl From<u8> for MobType {
    fn from(value: u8) -> MobType {
        match value {
            1 => MobType::Animal,
            2 => MobType::Mutant,
            3 => MobType::Humanoid,
            4 => MobType::Cyborg,
            5 => MobType::Robot,
            other => MobType::Unknown(other),
        }
    }
}

/// One 8-byte monster record from a map's monster data section.
pub struct Mob {
    name: String,
    hit_points: u16,
    hit_chance: u8,
    random_damage: u8,
    max_group_size: u8,
    armor_class: u8,
    fixed_damage: u8,
    damage_type: u8,
    mob_type: MobType,
    portrait: u8,
}

impl Mob {
    pub fn read(reader: &mut BinaryReader, name: String) -> Result<Mob> {
        let hit_points = reader.read_u16()?;
        let hit_chance = reader.read_u8()?;
        let random_damage = reader.read_u8()?;
        let max_group_size = reader.read_bits(4)? as u8;
        let armor_class = reader.read_bits(4)? as u8;
        let fixed_damage = reader.read_bits(4)? as u8;
        let damage_type = reader.read_bits(4)? as u8;
        let mob_type = MobType::from(reader.read_u8()?);
        let portrait = reader.read_u8()?;
        Ok(Mob {
            name,
            hit_points,
            hit_chance,
            random_damage,
            max_group_size,
            armor_class,
            fixed_damage,
            damage_type,
            mob_type,
            portrait,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hit_points(&self) -> u16 {
        self.hit_points
    }

    pub fn min_hit_points(&self) -> u16 {
        self.hit_points >> 2
    }

    pub fn max_hit_points(&self) -> u16 {
        (self.hit_points >> 2) + self.hit_points
    }

    pub fn hit_chance(&self) -> u8 {
        self.hit_chance
    }

    pub fn random_damage(&self) -> u8 {
        self.random_damage
    }

    pub fn max_group_size(&self) -> u8 {
        self.max_group_size
    }

    pub fn armor_class(&self) -> u8 {
        self.armor_class
    }

    pub fn fixed_damage(&self) -> u8 {
        self.fixed_damage
    }

    pub fn damage_type(&self) -> u8 {
        self.damage_type
    }

    pub fn mob_type(&self) -> MobType {
        self.mob_type
    }

    pub fn portrait(&self) -> u8 {
        self.portrait
    }

    pub fn experience(&self) -> u32 {
        self.hit_points as u32 * (self.armor_class as u32 + 1)
    }
}

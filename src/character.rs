use crate::{reader::BinaryReader, Result};

/// A learned skill slot of a character.
pub struct Skill {
    id: u8,
    level: u8,
}

impl Skill {
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

/// A carried item slot of a character.
pub struct Item {
    id: u8,
    load: u8,
}

impl Item {
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The ammo load for weapons, or a quantity for stacked items.
    pub fn load(&self) -> u8 {
        self.load
    }
}

fn read_skills(reader: &mut BinaryReader) -> Result<Vec<Skill>> {
    let mut skills = Vec::new();
    for _ in 0..30 {
        let id = reader.read_u8()?;
        let level = reader.read_u8()?;
        if id != 0 {
            skills.push(Skill { id, level });
        }
    }
    Ok(skills)
}

fn read_items(reader: &mut BinaryReader) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for _ in 0..30 {
        let id = reader.read_u8()?;
        let load = reader.read_u8()?;
        if id != 0 {
            items.push(Item { id, load });
        }
    }
    Ok(items)
}

/// A 256-byte character record. Fields whose meaning is still unknown are
/// kept as opaque bytes so a record can be reproduced losslessly.
pub struct Character {
    name: String,
    strength: u8,
    intelligence: u8,
    luck: u8,
    speed: u8,
    agility: u8,
    dexterity: u8,
    charisma: u8,
    money: u32,
    gender: u8,
    nationality: u8,
    armor_class: u8,
    max_con: u16,
    con: u16,
    weapon: u8,
    skill_points: u8,
    experience: u32,
    level: u8,
    armor: u8,
    last_con: u16,
    afflictions: u8,
    npc: bool,
    unknown_2a: u8,
    item_refuse: u8,
    skill_refuse: u8,
    attrib_refuse: u8,
    trade_refuse: u8,
    unknown_2f: u8,
    join_string: u8,
    willingness: u8,
    rank: String,
    game_won: bool,
    special_promotion: bool,
    unknown_4d: Vec<u8>,
    skills: Vec<Skill>,
    unknown_bc: u8,
    items: Vec<Item>,
    unknown_f9: Vec<u8>,
}

impl Character {
    pub fn read(reader: &mut BinaryReader) -> Result<Character> {
        let name = reader.read_fixed_str(14)?;
        let strength = reader.read_u8()?;
        let intelligence = reader.read_u8()?;
        let luck = reader.read_u8()?;
        let speed = reader.read_u8()?;
        let agility = reader.read_u8()?;
        let dexterity = reader.read_u8()?;
        let charisma = reader.read_u8()?;
        let money = reader.read_u24()?;
        let gender = reader.read_u8()?;
        let nationality = reader.read_u8()?;
        let armor_class = reader.read_u8()?;
        let max_con = reader.read_u16()?;
        let con = reader.read_u16()?;
        let weapon = reader.read_u8()?;
        let skill_points = reader.read_u8()?;
        let experience = reader.read_u24()?;
        let level = reader.read_u8()?;
        let armor = reader.read_u8()?;
        let last_con = reader.read_u16()?;
        let afflictions = reader.read_u8()?;
        let npc = reader.read_u8()? == 1;
        let unknown_2a = reader.read_u8()?;
        let item_refuse = reader.read_u8()?;
        let skill_refuse = reader.read_u8()?;
        let attrib_refuse = reader.read_u8()?;
        let trade_refuse = reader.read_u8()?;
        let unknown_2f = reader.read_u8()?;
        let join_string = reader.read_u8()?;
        let willingness = reader.read_u8()?;
        let rank = reader.read_fixed_str(25)?;
        let game_won = reader.read_u8()? == 1;
        let special_promotion = reader.read_u8()? == 1;
        let unknown_4d = reader.read_u8s(51)?;
        let skills = read_skills(reader)?;
        let unknown_bc = reader.read_u8()?;
        let items = read_items(reader)?;
        let unknown_f9 = reader.read_u8s(7)?;
        Ok(Character {
            name,
            strength,
            intelligence,
            luck,
            speed,
            agility,
            dexterity,
            charisma,
            money,
            gender,
            nationality,
            armor_class,
            max_con,
            con,
            weapon,
            skill_points,
            experience,
            level,
            armor,
            last_con,
            afflictions,
            npc,
            unknown_2a,
            item_refuse,
            skill_refuse,
            attrib_refuse,
            trade_refuse,
            unknown_2f,
            join_string,
            willingness,
            rank,
            game_won,
            special_promotion,
            unknown_4d,
            skills,
            unknown_bc,
            items,
            unknown_f9,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }

    pub fn intelligence(&self) -> u8 {
        self.intelligence
    }

    pub fn luck(&self) -> u8 {
        self.luck
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn agility(&self) -> u8 {
        self.agility
    }

    pub fn dexterity(&self) -> u8 {
        self.dexterity
    }

    pub fn charisma(&self) -> u8 {
        self.charisma
    }

    pub fn money(&self) -> u32 {
        self.money
    }

    pub fn gender(&self) -> u8 {
        self.gender
    }

    pub fn nationality(&self) -> u8 {
        self.nationality
    }

    pub fn armor_class(&self) -> u8 {
        self.armor_class
    }

    pub fn max_con(&self) -> u16 {
        self.max_con
    }

    pub fn con(&self) -> u16 {
        self.con
    }

    pub fn weapon(&self) -> u8 {
        self.weapon
    }

    pub fn skill_points(&self) -> u8 {
        self.skill_points
    }

    pub fn experience(&self) -> u32 {
        self.experience
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn armor(&self) -> u8 {
        self.armor
    }

    pub fn last_con(&self) -> u16 {
        self.last_con
    }

    pub fn afflictions(&self) -> u8 {
        self.afflictions
    }

    pub fn is_npc(&self) -> bool {
        self.npc
    }

    pub fn item_refuse(&self) -> u8 {
        self.item_refuse
    }

    pub fn skill_refuse(&self) -> u8 {
        self.skill_refuse
    }

    pub fn attrib_refuse(&self) -> u8 {
        self.attrib_refuse
    }

    pub fn trade_refuse(&self) -> u8 {
        self.trade_refuse
    }

    pub fn join_string(&self) -> u8 {
        self.join_string
    }

    pub fn willingness(&self) -> u8 {
        self.willingness
    }

    pub fn rank(&self) -> &str {
        &self.rank
    }

    pub fn is_game_won(&self) -> bool {
        self.game_won
    }

    pub fn is_special_promotion(&self) -> bool {
        self.special_promotion
    }

    pub fn skills(&self) -> &[Skill] {
        self.skills.as_slice()
    }

    pub fn items(&self) -> &[Item] {
        self.items.as_slice()
    }
}

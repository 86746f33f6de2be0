#![allow(dead_code)]

use dsp_core::GameVersion;
use dsp_core::schema::version::{DRONE_UPGRADE, VEIN_RELOCATION};

pub const CURRENT: GameVersion = GameVersion::new(0, 10, 33, 27005);
pub const LEGACY: GameVersion = GameVersion::new(0, 9, 24, 11000);

pub const TECH_WIDTH: usize = 29;
pub const ENTITY_WIDTH: usize = 36;
pub const VEIN_WIDTH: usize = 24;
pub const BELT_WIDTH: usize = 16;

/// Little-endian byte builder.
#[derive(Debug, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.u8(u8::from(v))
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn str_i32(&mut self, s: &str) -> &mut Self {
        self.i32(s.len() as i32).raw(s.as_bytes())
    }

    pub fn str_var(&mut self, s: &str) -> &mut Self {
        let mut len = s.len() as u32;
        while len >= 0x80 {
            self.u8((len as u8) | 0x80);
            len >>= 7;
        }
        self.u8(len as u8).raw(s.as_bytes())
    }
}

#[derive(Debug, Clone)]
pub struct Vein {
    pub vein_type: i16,
    pub amount: i32,
}

#[derive(Debug, Clone)]
pub struct Belt {
    pub id: i32,
    pub output_id: i32,
}

#[derive(Debug, Clone)]
pub struct Factory {
    pub planet_id: i32,
    pub entities: usize,
    pub veins: Vec<Vein>,
    pub belts: Vec<Belt>,
    pub digital_system: bool,
}

impl Default for Factory {
    fn default() -> Self {
        Self {
            planet_id: 103,
            entities: 2,
            veins: vec![
                Vein {
                    vein_type: 1,
                    amount: 1200,
                },
                Vein {
                    vein_type: 2,
                    amount: 800,
                },
                Vein {
                    vein_type: 1,
                    amount: 300,
                },
            ],
            belts: vec![
                Belt { id: 1, output_id: 2 },
                Belt { id: 2, output_id: 3 },
                Belt {
                    id: 3,
                    output_id: -1,
                },
            ],
            digital_system: true,
        }
    }
}

/// Builds a complete `.dsv` file in memory.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub format_version: i32,
    pub game_version: GameVersion,
    pub user_name: String,
    pub user_id: i32,
    pub game_name: String,
    pub themes: Vec<i32>,
    pub techs: Vec<i32>,
    pub sand_count: i64,
    pub factories: Vec<Factory>,
    pub image: Vec<u8>,
    pub trailing: Vec<u8>,
    /// Stored `file_length`; the true remainder when `None`.
    pub file_length: Option<i64>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            format_version: 7,
            game_version: CURRENT,
            user_name: "Icarus".to_string(),
            user_id: 42,
            game_name: "Sphere One".to_string(),
            themes: vec![1, 8, 14],
            techs: vec![1001, 1002],
            sand_count: 125_000,
            factories: vec![Factory::default()],
            image: vec![0x89, b'P', b'N', b'G', 0, 1],
            trailing: Vec::new(),
            file_length: None,
        }
    }
}

impl Fixture {
    pub fn at(game_version: GameVersion) -> Self {
        Self {
            game_version,
            ..Self::default()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let body = self.body();
        let mut out = Bytes::default();
        out.raw(b"VFSAVE");
        let remainder = body.len() as i64 - 14;
        out.i64(self.file_length.unwrap_or(remainder));
        out.raw(&body[14..]);
        out.0
    }

    fn body(&self) -> Vec<u8> {
        let v = self.game_version;
        let mut b = Bytes::default();
        b.raw(b"VFSAVE").i64(0).i32(self.format_version);
        if self.format_version >= 6 {
            b.bool(true);
        }
        if self.format_version >= 7 {
            b.bool(false);
        }
        b.i32(v.major).i32(v.minor).i32(v.release).i32(v.build);
        b.i64(36_000).i64(638_400_000_000_000_000);
        b.i32(self.image.len() as i32).raw(&self.image);

        b.str_i32(&self.user_name).i32(self.user_id);

        b.str_var(&self.game_name);
        b.i32(1).i32(19_283_746).i32(64).i32(1).f32(1.0);
        b.i32(self.themes.len() as i32);
        for theme in &self.themes {
            b.i32(*theme);
        }
        b.i64(36_000);

        b.i32(self.techs.len() as i32);
        for tech in &self.techs {
            b.i32(*tech).bool(true).i32(1).i32(1).i64(0).i64(3600);
        }
        b.bool(false).i32(0);

        b.i32(103).f32(1.5).f32(200.25).f32(-3.0).i64(self.sand_count);
        b.f64(5.0e9).f64(5.0e9).f32(7.5);
        if v >= DRONE_UPGRADE {
            b.f64(1.2e6).i32(3);
        }

        b.i32(self.factories.len() as i32);
        for factory in &self.factories {
            self.factory(&mut b, factory);
        }

        b.raw(&self.trailing);
        b.0
    }

    fn factory(&self, b: &mut Bytes, f: &Factory) {
        let relocated = self.game_version >= VEIN_RELOCATION;
        b.i32(f.planet_id).i32(7);
        b.i32(f.planet_id).f32(200.0);
        if !relocated {
            veins(b, &f.veins);
        }
        b.i32(f.entities as i32 + 1).i32(f.entities as i32);
        for i in 0..f.entities {
            b.i32(i as i32 + 1).i16(2001).i16(35);
            b.f32(0.0).f32(200.0).f32(i as f32);
            b.f32(0.0).f32(0.0).f32(0.0).f32(1.0);
        }
        if relocated {
            veins(b, &f.veins);
        }
        b.i32(f.belts.len() as i32);
        for belt in &f.belts {
            b.i32(belt.id).i32(belt.id + 100).i32(1).i32(belt.output_id);
        }
        b.u8(u8::from(f.digital_system));
        if f.digital_system {
            b.i32(0).i64(36_000);
        }
    }
}

fn veins(b: &mut Bytes, veins: &[Vein]) {
    b.i32(veins.len() as i32);
    for (i, vein) in veins.iter().enumerate() {
        b.i32(i as i32 + 1).i16(vein.vein_type).i16(i as i16);
        b.i32(vein.amount).f32(1.0).f32(2.0).f32(3.0);
    }
}

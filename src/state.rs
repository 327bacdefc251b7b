//! 戦況 (BattleState) モデルと参照シナリオ
//!
//! `/command` エンドポイントへ送る本文は `{"state": BattleState}` の形。
//! 各マップはキー順が安定するよう `BTreeMap` を使う。
//!
//! # 代表的な使い方
//! ```
//! use battle_client::state::{BattleState, Payload, Scenario};
//!
//! let state = BattleState::builder()
//!     .robot("robot1", true, [("소총 무장", 2)])
//!     .enemy("적 병사", 2)
//!     .flag("피격 여부", true)
//!     .responses(["소총", "대기"])
//!     .build();
//! let body = Payload::new(state).to_json().unwrap();
//! assert!(body.starts_with(r#"{"state":"#));
//!
//! assert_eq!(Scenario::Case1.battle_state().robot_availability.len(), 3);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 装備の状態コード: 0 = 他用途で使用中, 1 = 使用可能だが未計画, 2 = 計画済みで使用可能
pub type EquipmentCount = u32;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleState {
    pub robot_availability: BTreeMap<String, bool>,
    pub robot_equipment: BTreeMap<String, BTreeMap<String, EquipmentCount>>,
    pub enemy_size: BTreeMap<String, u32>,
    pub battlefield_info: BTreeMap<String, bool>,
    /// 応答候補。順序を保持する。
    pub possible_responses: Vec<String>,
}

impl BattleState {
    pub fn builder() -> BattleStateBuilder {
        BattleStateBuilder::default()
    }
}

/// 単一フィールドのラッパー。これがそのまま POST 本文になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub state: BattleState,
}

impl Payload {
    pub fn new(state: BattleState) -> Self {
        Self { state }
    }

    /// コンパクトな JSON 文字列へ直列化（非ASCIIはそのまま）
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `BattleState` をコードから組み立てるビルダー
#[derive(Debug, Default, Clone)]
pub struct BattleStateBuilder {
    state: BattleState,
}

impl BattleStateBuilder {
    /// ロボットを追加（可用性と装備をまとめて指定）
    pub fn robot<N, I, E>(mut self, name: N, available: bool, equipment: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (E, EquipmentCount)>,
        E: Into<String>,
    {
        let name = name.into();
        self.state.robot_availability.insert(name.clone(), available);
        let gear = self.state.robot_equipment.entry(name).or_default();
        for (item, count) in equipment {
            gear.insert(item.into(), count);
        }
        self
    }

    pub fn enemy<N: Into<String>>(mut self, category: N, count: u32) -> Self {
        self.state.enemy_size.insert(category.into(), count);
        self
    }

    pub fn flag<N: Into<String>>(mut self, name: N, value: bool) -> Self {
        self.state.battlefield_info.insert(name.into(), value);
        self
    }

    pub fn responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.possible_responses = responses.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> BattleState {
        self.state
    }
}

pub const RESPONSE_RIFLE: &str = "소총";
pub const RESPONSE_ANTI_TANK: &str = "대전차";
pub const RESPONSE_MINE_DETECTOR: &str = "지뢰탐지기";
pub const RESPONSE_RELAY: &str = "통신중계기";
pub const RESPONSE_EVADE: &str = "회피";
pub const RESPONSE_STANDBY: &str = "대기";
pub const RESPONSE_EXISTING_TASK: &str = "기존 과업";

pub const DEFAULT_RESPONSES: [&str; 7] = [
    RESPONSE_RIFLE,
    RESPONSE_ANTI_TANK,
    RESPONSE_MINE_DETECTOR,
    RESPONSE_RELAY,
    RESPONSE_EVADE,
    RESPONSE_STANDBY,
    RESPONSE_EXISTING_TASK,
];

/// 判断サーバーの例題として使われている4つの戦況
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// 地雷発見、迂回路あり
    Case1,
    /// 小規模の敵兵と交戦中
    Case2,
    /// 敵戦車と大規模な敵兵
    Case3,
    /// robot1/robot3 が使用不可
    Case4,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [Scenario::Case1, Scenario::Case2, Scenario::Case3, Scenario::Case4];

    /// 1始まりの番号から取得
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Scenario::Case1),
            2 => Some(Scenario::Case2),
            3 => Some(Scenario::Case3),
            4 => Some(Scenario::Case4),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Scenario::Case1 => 1,
            Scenario::Case2 => 2,
            Scenario::Case3 => 3,
            Scenario::Case4 => 4,
        }
    }

    pub fn battle_state(self) -> BattleState {
        // (robot1, robot2, robot3) availability, (tanks, soldiers), (detour, under_fire, mines)
        let (avail, enemy, flags) = match self {
            Scenario::Case1 => ([true, true, true], (0, 0), [true, false, true]),
            Scenario::Case2 => ([true, true, true], (0, 2), [false, true, false]),
            Scenario::Case3 => ([true, true, true], (1, 4), [false, false, false]),
            Scenario::Case4 => ([false, true, false], (0, 3), [false, false, false]),
        };
        BattleState::builder()
            .robot("robot1", avail[0], [("대전차 무장", 2), ("소총 무장", 2), ("통신중계기", 1)])
            .robot("robot2", avail[1], [("소총 무장", 2), ("통신중계기", 1)])
            .robot("robot3", avail[2], [("소총 무장", 1), ("지뢰탐지기", 2), ("통신중계기", 1)])
            .enemy("적 전차", enemy.0)
            .enemy("적 병사", enemy.1)
            .flag("우회로 여부", flags[0])
            .flag("피격 여부", flags[1])
            .flag("적 지뢰 여부", flags[2])
            .responses(DEFAULT_RESPONSES)
            .build()
    }

    /// 例題に付いている模範解答
    pub fn expected_decision(self) -> Value {
        match self {
            Scenario::Case1 => json!({
                "robot1": RESPONSE_EVADE,
                "robot2": RESPONSE_EVADE,
                "robot3": RESPONSE_EVADE,
                "description": "robot3의 지뢰탐지기가 지뢰 발견 시, 지뢰 제거 도구가 없기에 우회로를 통해 회피. 모든 로봇은 안전을 위해 함께 회피한다."
            }),
            Scenario::Case2 => json!({
                "robot1": RESPONSE_RIFLE,
                "robot2": RESPONSE_RIFLE,
                "robot3": RESPONSE_STANDBY,
                "description": "소규모 적 병사 조우 시, 기존에 계획된 robot1과 robot2의 소총으로 대응."
            }),
            Scenario::Case3 => json!({
                "robot1": RESPONSE_ANTI_TANK,
                "robot2": RESPONSE_RIFLE,
                "robot3": RESPONSE_RIFLE,
                "description": "적 전차 및 대규모 적 병사 발견 시, 대전차 무장이 존재하는 robot1은 대전차로, 나머지는 소총으로 대응. robot3은 기존에 소총 무장이 계획되지 않았으나 대규모 적 대응을 위해 사용."
            }),
            Scenario::Case4 => json!({
                "robot1": RESPONSE_EXISTING_TASK,
                "robot2": RESPONSE_RIFLE,
                "robot3": RESPONSE_EXISTING_TASK,
                "description": "robot1과 robot3은 기존에 발생한 교전으로 인해 가용불가능할 때, robot2만 가용하므로 새로운 적에 대응."
            }),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {}", self.number())
    }
}

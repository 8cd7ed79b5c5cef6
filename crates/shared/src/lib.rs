use serde::{Deserialize, Serialize};

pub mod naming;

pub use naming::{parse_name, NameInfo};

/// Уникальный идентификатор узла сцены
pub type NodeId = String;

/// Ссылка на меш (для подсветки выделения)
pub type MeshRef = String;

/// Диаметр точки привязки по умолчанию (метры)
pub const SNAP_DIAMETER: f32 = 0.1;

fn default_attraction() -> f32 {
    SNAP_DIAMETER * 2.0
}

fn default_mass() -> f32 {
    1.0
}

/// Точка привязки на размещённом объекте
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    /// Метка (front/back/left/right для точек по умолчанию)
    #[serde(default)]
    pub label: String,
    /// Позиция в локальных координатах объекта
    pub position: [f32; 3],
    /// Ориентация (углы Эйлера XYZ) в локальных координатах
    #[serde(default)]
    pub rotation: [f32; 3],
    /// Радиус притяжения
    #[serde(default = "default_attraction")]
    pub attraction_radius: f32,
    /// Точка уже использована в соединении
    #[serde(default)]
    pub is_used: bool,
}

impl SnapPoint {
    pub fn new(label: impl Into<String>, position: [f32; 3], rotation: [f32; 3]) -> Self {
        Self {
            label: label.into(),
            position,
            rotation,
            attraction_radius: default_attraction(),
            is_used: false,
        }
    }

    pub fn with_attraction(mut self, radius: f32) -> Self {
        self.attraction_radius = radius.max(0.0);
        self
    }
}

/// Метаданные узла сцены (userData)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub name: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default)]
    pub snap_points: Vec<SnapPoint>,
    /// Узел: размещённый объект
    #[serde(default)]
    pub is_placed_object: bool,
    /// Узел: группа сцеплённых объектов
    #[serde(default)]
    pub is_snapped_group: bool,
    /// Узел: контейнер, в который размещаются объекты
    #[serde(default)]
    pub is_placement_target: bool,
    /// Кэш мешей для подсветки
    #[serde(default)]
    pub meshes: Vec<MeshRef>,
}

impl ObjectMetadata {
    /// Пустые метаданные для обычного узла
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group_id: String::new(),
            tags: Vec::new(),
            instance_id: String::new(),
            mass: default_mass(),
            snap_points: Vec::new(),
            is_placed_object: false,
            is_snapped_group: false,
            is_placement_target: false,
            meshes: Vec::new(),
        }
    }

    /// Метаданные размещённого объекта; группа/теги/экземпляр берутся из имени
    pub fn placed(name: impl Into<String>, mass: f32) -> Self {
        let name = name.into();
        let info = parse_name(&name);
        Self {
            group_id: info.group_id,
            tags: info.tags,
            instance_id: info.instance_id,
            mass,
            is_placed_object: true,
            ..Self::named(name)
        }
    }

    /// Метаданные контейнера для размещения
    pub fn placement_target(name: impl Into<String>) -> Self {
        Self {
            is_placement_target: true,
            ..Self::named(name)
        }
    }

    /// Объект можно выделить и перетаскивать
    pub fn is_placeable(&self) -> bool {
        self.is_placed_object || self.is_snapped_group
    }
}

/// Параметры размещения объекта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlacementOptions {
    /// Имя объекта (иначе имя из загрузчика)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Мировая позиция XZ (иначе позиция курсора)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    /// Высота падения над полом
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_height: Option<f32>,
    /// Начальный поворот (углы Эйлера XYZ)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 3]>,
    /// Собственные точки привязки (заменяют точки по умолчанию)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snap_points: Vec<SnapPoint>,
}

/// Одна операция размещения в сценарии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedPlacement {
    pub url: String,
    #[serde(default)]
    pub options: PlacementOptions,
}

/// Модель, доступная загрузчику в сценарии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedModel {
    pub url: String,
    pub name: String,
    /// Габариты модели (ширина, высота, глубина)
    pub size: [f32; 3],
}

/// Сценарий размещения: модели, размещения и число кадров
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlacementScript {
    pub models: Vec<ScriptedModel>,
    pub placements: Vec<ScriptedPlacement>,
    /// Дополнительные кадры по 16 мс после всех размещений
    #[serde(default)]
    pub frames: u32,
}

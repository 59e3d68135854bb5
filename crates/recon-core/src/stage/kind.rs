use serde::{Deserialize, Serialize};

/// Etapas conocidas. El orden de declaración es el orden de ejecución: las
/// segmentaciones van primero porque la conversión de volúmenes consume sus
/// etiquetas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    HippocampalSubfields,
    BrainstemStructures,
    ThalamicNuclei,
    HypothalamicSubunits,
    Gtmseg,
    RegisterSurfaces,
    ConvertSurfaces,
    ConvertVolumes,
    ConvertStats,
}

impl StageKind {
    pub const ORDERED: [StageKind; 9] = [StageKind::HippocampalSubfields,
                                         StageKind::BrainstemStructures,
                                         StageKind::ThalamicNuclei,
                                         StageKind::HypothalamicSubunits,
                                         StageKind::Gtmseg,
                                         StageKind::RegisterSurfaces,
                                         StageKind::ConvertSurfaces,
                                         StageKind::ConvertVolumes,
                                         StageKind::ConvertStats];

    /// Nombre estable (snake_case); se usa en claves de config, directorios
    /// de derivados y en el journal.
    pub fn name(self) -> &'static str {
        match self {
            StageKind::HippocampalSubfields => "hippocampal_subfields",
            StageKind::BrainstemStructures => "brainstem_structures",
            StageKind::ThalamicNuclei => "thalamic_nuclei",
            StageKind::HypothalamicSubunits => "hypothalamic_subunits",
            StageKind::Gtmseg => "gtmseg",
            StageKind::RegisterSurfaces => "register_surfaces",
            StageKind::ConvertSurfaces => "convert_surfaces",
            StageKind::ConvertVolumes => "convert_volumes",
            StageKind::ConvertStats => "convert_stats",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ORDERED.iter().copied().find(|k| k.name() == name)
    }

    /// Clave booleana del manifiesto que habilita la etapa.
    pub fn gate_key(self) -> String {
        format!("gear-{}", self.name())
    }

    /// Las segmentaciones corren herramientas propias contra la
    /// reconstrucción ya completa.
    pub fn is_segmentation(self) -> bool {
        matches!(self,
                 StageKind::HippocampalSubfields
                 | StageKind::BrainstemStructures
                 | StageKind::ThalamicNuclei
                 | StageKind::HypothalamicSubunits
                 | StageKind::Gtmseg)
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

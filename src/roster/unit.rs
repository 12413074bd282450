//! Unit loadout engine: applies selected options to a unit and keeps its points current.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{BattlefieldRole, Catalog, CatalogError, UnitTemplate};
use crate::options::{
    parse_wargear, split_clauses, OptionError, RenderContext, RenderedOption, Scope, SelectionError,
    WargearOption,
};
use crate::roster::ModelGroup;
use crate::wargear::{remove_first, Wargear};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{unit}: cannot read '{clause}': {source}")]
    Option {
        unit: String,
        clause: String,
        #[source]
        source: OptionError,
    },
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("option needs {required} models but the unit has {current}; {shortfall} more would cost {cost_delta}pts")]
    InsufficientModels {
        required: u32,
        current: u32,
        shortfall: u32,
        cost_delta: u32,
    },
    #[error("{unit} must have between {min} and {max} models, not {requested}")]
    InvalidSize {
        unit: String,
        requested: u32,
        min: u32,
        max: u32,
    },
    #[error("{unit} may include at most {limit} {model}, not {requested}")]
    TooManyModels {
        unit: String,
        model: String,
        limit: u32,
        requested: u32,
    },
    #[error("{unit} has {expected} model types but {got} counts were given")]
    ModelCountMismatch {
        unit: String,
        expected: usize,
        got: usize,
    },
    #[error("{unit} has no option {index} ({available} available)")]
    NoSuchOption {
        unit: String,
        index: usize,
        available: usize,
    },
    #[error("{unit} has no unequipped models left")]
    NoModelsAvailable { unit: String },
    #[error("{unit} may equip {entitled} model(s) through '{option}' and all of them are taken")]
    EntitlementUsed {
        unit: String,
        option: String,
        entitled: u32,
    },
}

/// Serializable snapshot of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub name: String,
    pub unit: String,
    pub role: BattlefieldRole,
    pub size: u32,
    pub size_range: [u32; 2],
    pub points: u32,
    pub wargear: Vec<String>,
    pub models: Vec<ModelSummary>,
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub kind: String,
    pub count: u32,
    pub points_each: u32,
    pub loadout: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Unit {
    catalog: Arc<Catalog>,
    template: Arc<UnitTemplate>,
    role: BattlefieldRole,
    name: String,
    wargear: Vec<Wargear>,
    models: Vec<ModelGroup>,
    options: Option<Vec<WargearOption>>,
    points: u32,
}

impl Unit {
    pub fn new(catalog: &Arc<Catalog>, role: BattlefieldRole, unit_name: &str) -> Result<Self, RosterError> {
        let template = catalog.unit(role, unit_name)?;
        let mut unit = Self {
            catalog: Arc::clone(catalog),
            name: template.name.clone(),
            template,
            role,
            wargear: Vec::new(),
            models: Vec::new(),
            options: None,
            points: 0,
        };
        unit.reset()?;
        Ok(unit)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &UnitTemplate {
        &self.template
    }

    pub fn role(&self) -> BattlefieldRole {
        self.role
    }

    /// Base wargear carried by every model that has not exchanged it.
    pub fn wargear(&self) -> &[Wargear] {
        &self.wargear
    }

    pub fn models(&self) -> &[ModelGroup] {
        &self.models
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn size(&self) -> u32 {
        self.models.iter().map(|group| group.count).sum()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    fn scope(&self) -> Scope {
        if self.template.max_size() > 1 {
            Scope::Unit
        } else {
            Scope::Model
        }
    }

    pub fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            wargear: &self.wargear,
            scope: self.scope(),
        }
    }

    fn option_error(&self, clause: &str, source: OptionError) -> RosterError {
        RosterError::Option {
            unit: self.template.name.clone(),
            clause: clause.to_string(),
            source,
        }
    }

    fn parse_loadout(&self, entries: &[String]) -> Result<Vec<Wargear>, RosterError> {
        entries
            .iter()
            .map(|entry| {
                parse_wargear(self.catalog.armoury(), entry).map_err(|err| self.option_error(entry, err))
            })
            .collect()
    }

    /// Back to the catalog state: minimum size, default wargear, no options parsed.
    pub fn reset(&mut self) -> Result<(), RosterError> {
        self.wargear = self.parse_loadout(&self.template.wargear)?;
        self.models = vec![ModelGroup::new(
            self.template.name.clone(),
            self.template.min_size(),
            self.template.base_points,
        )];
        self.options = None;
        self.refresh_points();
        Ok(())
    }

    fn ensure_options(&mut self) -> Result<&mut Vec<WargearOption>, RosterError> {
        if self.options.is_none() {
            let ctx = self.render_context();
            let mut parsed = Vec::new();
            for entry in &self.template.options {
                for clause in split_clauses(entry) {
                    let option = WargearOption::parse(self.catalog.armoury(), clause, &ctx)
                        .map_err(|err| self.option_error(clause, err))?;
                    parsed.push(option);
                }
            }
            tracing::debug!(unit = %self.template.name, options = parsed.len(), "options parsed");
            self.options = Some(parsed);
        }
        Ok(self.options.get_or_insert_with(Vec::new))
    }

    /// Parsed options, built on first use and cached until [`reset`](Self::reset).
    pub fn options(&mut self) -> Result<&[WargearOption], RosterError> {
        self.ensure_options().map(|options| options.as_slice())
    }

    pub fn option_mut(&mut self, index: usize) -> Result<&mut WargearOption, RosterError> {
        let unit = self.template.name.clone();
        let options = self.ensure_options()?;
        let available = options.len();
        options.get_mut(index).ok_or(RosterError::NoSuchOption {
            unit,
            index,
            available,
        })
    }

    /// Every option rendered against the current base wargear.
    pub fn render_options(&mut self) -> Result<Vec<RenderedOption>, RosterError> {
        self.ensure_options()?;
        let ctx = self.render_context();
        Ok(self
            .options
            .as_deref()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, option)| option.describe(index, &ctx))
            .collect())
    }

    pub fn has_pending_selection(&self) -> bool {
        self.options
            .as_deref()
            .map_or(false, |options| options.iter().any(WargearOption::has_selection))
    }

    pub fn clear_selections(&mut self) {
        if let Some(options) = self.options.as_mut() {
            options.iter_mut().for_each(WargearOption::clear_selection);
        }
    }

    fn default_model_cost(&self) -> u32 {
        self.models
            .first()
            .map_or(self.template.base_points, |group| group.per_model_cost(&self.wargear))
    }

    /// Applies one option's selection to the unit.
    pub fn apply_option(&mut self, option: &WargearOption) -> Result<(), RosterError> {
        option.check_picks()?;

        let size = self.size();
        let required = option.models_required_per();
        if required > size {
            let shortfall = required - size;
            return Err(RosterError::InsufficientModels {
                required,
                current: size,
                shortfall,
                cost_delta: shortfall.saturating_mul(self.default_model_cost()),
            });
        }

        let selected = option.selected();
        if selected.is_empty() {
            tracing::debug!(unit = %self.name, option = option.source(), "nothing selected; option skipped");
            return Ok(());
        }

        if required > 1 || (option.per_model() && size > 1) {
            self.carve_variant(option, &selected)?;
        } else {
            self.apply_to_unit(option.items_involved(), selected);
        }
        self.refresh_points();
        tracing::debug!(unit = %self.name, option = option.source(), points = self.points, "option applied");
        Ok(())
    }

    fn apply_to_unit(&mut self, involved: &[Wargear], selected: Vec<Wargear>) {
        for item in involved {
            if !remove_first(&mut self.wargear, item) {
                if let Some(default) = self.models.first_mut() {
                    remove_first(&mut default.wargear, item);
                }
            }
        }
        self.wargear.extend(selected);
    }

    /// Moves models out of the default group into a group carrying the selection.
    ///
    /// A per-N option equips at most `size / N` models in total, shared between every
    /// group it has carved. Choosing the gear the models already carry changes nothing.
    fn carve_variant(&mut self, option: &WargearOption, selected: &[Wargear]) -> Result<(), RosterError> {
        let Some(default) = self.models.first() else {
            return Err(RosterError::NoModelsAvailable {
                unit: self.name.clone(),
            });
        };

        let mut variant = default.clone();
        variant.count = 0;
        let loadout = default.loadout(&self.wargear);
        for item in option.items_involved() {
            if !loadout.contains(item) {
                continue;
            }
            if !remove_first(&mut variant.wargear, item) {
                variant.exchanged.push(item.clone());
            }
        }
        variant.wargear.extend(selected.iter().cloned());

        if variant.same_loadout(default, &self.wargear) {
            tracing::debug!(unit = %self.name, option = option.source(), "choice keeps current gear");
            return Ok(());
        }

        let existing = self
            .models
            .iter()
            .skip(1)
            .position(|group| group.same_loadout(&variant, &self.wargear))
            .map(|offset| offset + 1);
        let current = existing.map_or(0, |index| self.models[index].count);
        let target = if option.per_model() {
            current + 1
        } else {
            let entitled = self.size() / option.models_required_per();
            let taken = self.carved_by(option, existing);
            if taken >= entitled {
                return Err(RosterError::EntitlementUsed {
                    unit: self.name.clone(),
                    option: option.source().to_string(),
                    entitled,
                });
            }
            entitled - taken
        };

        let available = self.models[0].count;
        let wanted = target.saturating_sub(current);
        if wanted > 0 && available == 0 {
            return Err(RosterError::NoModelsAvailable {
                unit: self.name.clone(),
            });
        }
        let moved = wanted.min(available);
        if moved < wanted {
            tracing::debug!(unit = %self.name, wanted, moved, "not enough default models to equip");
        }
        let returned = current.saturating_sub(target);
        let new_count = current + moved - returned;

        self.models[0].count = available - moved + returned;
        match existing {
            Some(index) => self.models[index].count = new_count,
            None => {
                variant.count = new_count;
                self.models.push(variant);
            }
        }
        let mut position = 0;
        self.models.retain(|group| {
            let keep = position == 0 || group.count > 0;
            position += 1;
            keep
        });
        Ok(())
    }

    /// Models in groups other than `skip` that carry one of `option`'s items beyond
    /// the default loadout.
    fn carved_by(&self, option: &WargearOption, skip: Option<usize>) -> u32 {
        let Some(default) = self.models.first() else {
            return 0;
        };
        let offered: Vec<String> = option.items_involved().iter().map(Wargear::name).collect();
        self.models
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(index, group)| Some(*index) != skip && group.kind == default.kind)
            .filter(|(_, group)| {
                group
                    .gained_over(default, &self.wargear)
                    .iter()
                    .any(|item| offered.contains(&item.name()))
            })
            .map(|(_, group)| group.count)
            .sum()
    }

    /// Applies several options; on failure the unit is left as it was.
    pub fn apply_options(&mut self, options: &[WargearOption]) -> Result<(), RosterError> {
        let snapshot = (self.wargear.clone(), self.models.clone(), self.points);
        for option in options {
            if let Err(err) = self.apply_option(option) {
                (self.wargear, self.models, self.points) = snapshot;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Applies every cached option that has a selection, then clears the selections.
    pub fn apply_selected(&mut self) -> Result<(), RosterError> {
        let pending: Vec<WargearOption> = self
            .options
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|option| option.has_selection())
            .cloned()
            .collect();
        for option in &pending {
            option.check_picks()?;
        }
        self.apply_options(&pending)?;
        self.clear_selections();
        Ok(())
    }

    fn check_range(&self, requested: u32) -> Result<(), RosterError> {
        let [min, max] = self.template.size;
        if requested < min || requested > max {
            return Err(RosterError::InvalidSize {
                unit: self.name.clone(),
                requested,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Sets the unit size by growing or shrinking the default group.
    pub fn resize(&mut self, size: u32) -> Result<(), RosterError> {
        self.check_range(size)?;
        let others: u32 = self.models.iter().skip(1).map(|group| group.count).sum();
        if size < others {
            return Err(RosterError::InvalidSize {
                unit: self.name.clone(),
                requested: size,
                min: others.max(self.template.min_size()),
                max: self.template.max_size(),
            });
        }
        if let Some(default) = self.models.first_mut() {
            default.count = size - others;
        }
        self.refresh_points();
        Ok(())
    }

    /// One count per model type: the unit's own models first, then each extra model
    /// type in catalog order.
    pub fn resize_models(&mut self, counts: &[u32]) -> Result<(), RosterError> {
        let expected = 1 + self.template.models.len();
        if counts.len() != expected {
            return Err(RosterError::ModelCountMismatch {
                unit: self.name.clone(),
                expected,
                got: counts.len(),
            });
        }
        self.check_range(counts.iter().sum())?;

        let mut extra_groups = Vec::new();
        for (kind, &count) in self.template.models.iter().zip(&counts[1..]) {
            let template = self.catalog.model(kind)?;
            if let Some(limit) = template.limit {
                if count > limit {
                    return Err(RosterError::TooManyModels {
                        unit: self.name.clone(),
                        model: kind.clone(),
                        limit,
                        requested: count,
                    });
                }
            }
            if count == 0 {
                continue;
            }
            let mut group = ModelGroup::new(kind.clone(), count, template.points);
            group.limit = template.limit;
            group.wargear = self.parse_loadout(&template.wargear)?;
            group.exchanged = self.wargear.clone();
            extra_groups.push(group);
        }

        let own_kind = self.template.name.clone();
        let variants: u32 = self
            .models
            .iter()
            .skip(1)
            .filter(|group| group.kind == own_kind)
            .map(|group| group.count)
            .sum();
        if counts[0] < variants {
            return Err(RosterError::InvalidSize {
                unit: self.name.clone(),
                requested: counts[0],
                min: variants,
                max: self.template.max_size(),
            });
        }

        self.models.retain(|group| group.kind == own_kind);
        if let Some(default) = self.models.first_mut() {
            default.count = counts[0] - variants;
        }
        self.models.extend(extra_groups);
        self.refresh_points();
        Ok(())
    }

    /// Problems that make the unit illegal as it stands.
    pub fn check_validity(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let [min, max] = self.template.size;
        let size = self.size();
        if size < min || size > max {
            problems.push(format!(
                "{} has {size} models; it must have between {min} and {max}",
                self.name
            ));
        }
        for group in &self.models {
            let Some(limit) = group.limit else { continue };
            let total: u32 = self
                .models
                .iter()
                .filter(|other| other.kind == group.kind)
                .map(|other| other.count)
                .sum();
            let message = format!(
                "{} may include at most {limit} {}, not {total}",
                self.name, group.kind
            );
            if total > limit && !problems.contains(&message) {
                problems.push(message);
            }
        }
        problems
    }

    /// Base wargear followed by each group's own gear.
    pub fn all_wargear(&self) -> Vec<Wargear> {
        let mut all = self.wargear.clone();
        for group in &self.models {
            all.extend(group.wargear.iter().cloned());
        }
        all
    }

    fn refresh_points(&mut self) {
        self.points = self
            .models
            .iter()
            .fold(0, |total, group| total.saturating_add(group.points(&self.wargear)));
    }

    pub fn summary(&self) -> UnitSummary {
        UnitSummary {
            name: self.name.clone(),
            unit: self.template.name.clone(),
            role: self.role,
            size: self.size(),
            size_range: self.template.size,
            points: self.points,
            wargear: self.wargear.iter().map(Wargear::label).collect(),
            models: self
                .models
                .iter()
                .map(|group| ModelSummary {
                    kind: group.kind.clone(),
                    count: group.count,
                    points_each: group.per_model_cost(&self.wargear),
                    loadout: group.loadout(&self.wargear).iter().map(Wargear::label).collect(),
                })
                .collect(),
            problems: self.check_validity(),
        }
    }
}

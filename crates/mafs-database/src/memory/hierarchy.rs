use async_trait::async_trait;

use mafs_core::AppError;
use mafs_core::result::AppResult;
use mafs_entity::hierarchy::{Area, Line, Machine, NewProductionUnit, Plant, ProductionUnit};

use super::MemoryStore;
use crate::store::HierarchyStore;

#[async_trait]
impl HierarchyStore for MemoryStore {
    async fn plants(&self) -> AppResult<Vec<Plant>> {
        let mut plants = self.data.read().await.plants.clone();
        plants.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(plants)
    }

    async fn areas(&self, plant_id: i64) -> AppResult<Vec<Area>> {
        let data = self.data.read().await;
        let mut areas: Vec<Area> = data
            .areas
            .iter()
            .filter(|a| a.plant_id == plant_id)
            .cloned()
            .collect();
        areas.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(areas)
    }

    async fn lines(&self, area_id: i64) -> AppResult<Vec<Line>> {
        let data = self.data.read().await;
        let mut lines: Vec<Line> = data
            .lines
            .iter()
            .filter(|l| l.area_id == area_id)
            .cloned()
            .collect();
        lines.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(lines)
    }

    async fn machines(&self, line_id: i64) -> AppResult<Vec<Machine>> {
        let data = self.data.read().await;
        let mut machines: Vec<Machine> = data
            .machines
            .iter()
            .filter(|m| m.line_id == line_id)
            .cloned()
            .collect();
        machines.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(machines)
    }

    async fn search_units(
        &self,
        search: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<ProductionUnit>> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let data = self.data.read().await;
        let mut units: Vec<ProductionUnit> = data
            .units
            .values()
            .filter(|u| u.is_active)
            .filter(|u| match &needle {
                Some(n) => u.pucode.to_lowercase().contains(n) || u.name.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect();
        units.sort_by(|a, b| a.pucode.cmp(&b.pucode));
        units.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(units)
    }

    async fn find_unit_by_code(&self, pucode: &str) -> AppResult<Option<ProductionUnit>> {
        Ok(self
            .data
            .read()
            .await
            .units
            .values()
            .find(|u| u.pucode.eq_ignore_ascii_case(pucode))
            .cloned())
    }

    async fn find_unit(&self, id: i64) -> AppResult<Option<ProductionUnit>> {
        Ok(self.data.read().await.units.get(&id).cloned())
    }

    async fn create_unit(&self, new: NewProductionUnit) -> AppResult<ProductionUnit> {
        let pucode = new.pucode();
        let mut data = self.data.write().await;
        if data.units.values().any(|u| u.pucode == pucode) {
            return Err(AppError::conflict(
                "A production unit with this code already exists",
            ));
        }
        let unit = ProductionUnit {
            id: data.next_id(),
            pucode,
            plant: new.plant.trim().to_uppercase(),
            area: new.area.trim().to_uppercase(),
            line: new.line.trim().to_uppercase(),
            machine: new.machine.trim().to_uppercase(),
            name: new.name,
            is_active: true,
        };
        data.units.insert(unit.id, unit.clone());
        Ok(unit)
    }
}

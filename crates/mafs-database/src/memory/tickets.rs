use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use mafs_core::AppError;
use mafs_core::result::AppResult;
use mafs_core::types::{PageRequest, PageResponse};
use mafs_entity::dashboard::{
    DashboardFilter, DashboardSummary, ReporterCount, StatusCount, TrendPoint,
};
use mafs_entity::ticket::{
    NewAttachment, NewHistory, NewTicket, Ticket, TicketAttachment, TicketComment, TicketFilter,
    TicketHistory, TicketPatch, TicketStatus, format_ticket_number,
};

use super::{MemoryData, MemoryStore};
use crate::store::TicketStore;

fn apply_patch(ticket: &mut Ticket, patch: TicketPatch) {
    if let Some(v) = patch.title {
        ticket.title = v;
    }
    if let Some(v) = patch.description {
        ticket.description = v;
    }
    if let Some(v) = patch.pu_id {
        ticket.pu_id = Some(v);
    }
    if let Some(v) = patch.severity {
        ticket.severity = v;
    }
    if let Some(v) = patch.priority {
        ticket.priority = v;
    }
    if let Some(v) = patch.due_date {
        ticket.due_date = Some(v);
    }
    if let Some(v) = patch.status {
        ticket.status = v;
    }
    if let Some(v) = patch.assigned_to {
        ticket.assigned_to = Some(v);
    }
    if let Some(v) = patch.escalated_to {
        ticket.escalated_to = v;
    }
    if let Some(v) = patch.resolved_at {
        ticket.resolved_at = Some(v);
    }
    if let Some(v) = patch.closed_at {
        ticket.closed_at = Some(v);
    }
    if let Some(v) = patch.cost_avoidance {
        ticket.cost_avoidance = Some(v);
    }
    if let Some(v) = patch.downtime_hours {
        ticket.downtime_hours = Some(v);
    }
    if let Some(v) = patch.failure_mode {
        ticket.failure_mode = Some(v);
    }
    ticket.updated_at = Utc::now();
}

fn push_history(data: &mut MemoryData, history: NewHistory) {
    let row = TicketHistory {
        id: data.next_id(),
        ticket_id: history.ticket_id,
        from_status: history.from_status,
        to_status: history.to_status,
        action: history.action,
        actor_id: history.actor_id,
        note: history.note,
        created_at: Utc::now(),
    };
    data.history.push(row);
}

fn in_window(at: DateTime<Utc>, filter: &DashboardFilter) -> bool {
    filter.from.is_none_or(|from| at >= from) && filter.to.is_none_or(|to| at < to)
}

fn in_plant(data: &MemoryData, ticket: &Ticket, filter: &DashboardFilter) -> bool {
    match filter.plant.as_deref() {
        Some(plant) => ticket
            .pu_id
            .and_then(|id| data.units.get(&id))
            .is_some_and(|unit| unit.plant == plant),
        None => true,
    }
}

fn in_scope(data: &MemoryData, ticket: &Ticket, filter: &DashboardFilter) -> bool {
    in_window(ticket.created_at, filter) && in_plant(data, ticket, filter)
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create(&self, new: NewTicket) -> AppResult<Ticket> {
        let mut data = self.data.write().await;
        let now = Utc::now();
        let today = now.date_naive();
        let prefix = format!("AB-{}-", today.format("%Y%m%d"));
        let sequence = data
            .tickets
            .values()
            .filter_map(|t| t.ticket_number.strip_prefix(&prefix))
            .filter_map(|seq| seq.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let ticket = Ticket {
            id: data.next_id(),
            ticket_number: format_ticket_number(today, sequence),
            title: new.title,
            description: new.description,
            pu_id: new.pu_id,
            status: TicketStatus::Open,
            severity: new.severity,
            priority: new.priority,
            created_by: new.created_by,
            assigned_to: None,
            escalated_to: None,
            due_date: new.due_date,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
            cost_avoidance: None,
            downtime_hours: None,
            failure_mode: None,
        };
        data.tickets.insert(ticket.id, ticket.clone());
        push_history(
            &mut data,
            NewHistory {
                ticket_id: ticket.id,
                from_status: None,
                to_status: TicketStatus::Open,
                action: "create".to_string(),
                actor_id: ticket.created_by,
                note: None,
            },
        );
        Ok(ticket)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Ticket>> {
        Ok(self.data.read().await.tickets.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &TicketFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Ticket>> {
        let data = self.data.read().await;
        let mut tickets: Vec<Ticket> = data
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(PageResponse::from_vec(tickets, page))
    }

    async fn update(&self, id: i64, patch: TicketPatch) -> AppResult<Ticket> {
        let mut data = self.data.write().await;
        let ticket = data
            .tickets
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))?;
        apply_patch(ticket, patch);
        Ok(ticket.clone())
    }

    async fn transition(
        &self,
        id: i64,
        patch: TicketPatch,
        history: NewHistory,
    ) -> AppResult<Ticket> {
        let mut data = self.data.write().await;
        let ticket = data
            .tickets
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))?;
        apply_patch(ticket, patch);
        let updated = ticket.clone();
        push_history(&mut data, history);
        Ok(updated)
    }

    async fn history(&self, ticket_id: i64) -> AppResult<Vec<TicketHistory>> {
        Ok(self
            .data
            .read()
            .await
            .history
            .iter()
            .filter(|h| h.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn add_comment(
        &self,
        ticket_id: i64,
        user_id: i64,
        body: &str,
    ) -> AppResult<TicketComment> {
        let mut data = self.data.write().await;
        let comment = TicketComment {
            id: data.next_id(),
            ticket_id,
            user_id,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        data.comments.push(comment.clone());
        Ok(comment)
    }

    async fn comments(&self, ticket_id: i64) -> AppResult<Vec<TicketComment>> {
        Ok(self
            .data
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn add_attachment(&self, new: NewAttachment) -> AppResult<TicketAttachment> {
        let mut data = self.data.write().await;
        let attachment = TicketAttachment {
            id: data.next_id(),
            ticket_id: new.ticket_id,
            uploaded_by: new.uploaded_by,
            kind: new.kind,
            file_name: new.file_name,
            stored_path: new.stored_path,
            mime_type: new.mime_type,
            size_bytes: new.size_bytes,
            created_at: Utc::now(),
        };
        data.attachments.insert(attachment.id, attachment.clone());
        Ok(attachment)
    }

    async fn attachments(&self, ticket_id: i64) -> AppResult<Vec<TicketAttachment>> {
        Ok(self
            .data
            .read()
            .await
            .attachments
            .values()
            .filter(|a| a.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn find_attachment(&self, id: i64) -> AppResult<Option<TicketAttachment>> {
        Ok(self.data.read().await.attachments.get(&id).cloned())
    }

    async fn delete_attachment(&self, id: i64) -> AppResult<()> {
        self.data
            .write()
            .await
            .attachments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Attachment {id} not found")))
    }

    async fn stale_open(&self, created_before: DateTime<Utc>) -> AppResult<Vec<Ticket>> {
        let data = self.data.read().await;
        let mut tickets: Vec<Ticket> = data
            .tickets
            .values()
            .filter(|t| t.status == TicketStatus::Open && t.created_at <= created_before)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tickets)
    }

    async fn due_before(&self, due_before: DateTime<Utc>) -> AppResult<Vec<Ticket>> {
        let data = self.data.read().await;
        let mut tickets: Vec<Ticket> = data
            .tickets
            .values()
            .filter(|t| {
                t.assigned_to.is_some()
                    && !t.status.is_done()
                    && t.due_date.is_some_and(|due| due <= due_before)
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        Ok(tickets)
    }

    async fn pending(&self) -> AppResult<Vec<Ticket>> {
        let data = self.data.read().await;
        let mut tickets: Vec<Ticket> = data
            .tickets
            .values()
            .filter(|t| {
                (t.status.awaits_assignee() && t.assigned_to.is_some())
                    || t.status.awaits_manager()
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tickets)
    }

    async fn summary(
        &self,
        filter: &DashboardFilter,
        now: DateTime<Utc>,
    ) -> AppResult<DashboardSummary> {
        let data = self.data.read().await;
        let scoped: Vec<&Ticket> = data
            .tickets
            .values()
            .filter(|t| in_scope(&data, t, filter))
            .collect();

        let status_counts = TicketStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: scoped.iter().filter(|t| t.status == status).count() as i64,
            })
            .filter(|c| c.count > 0)
            .collect();

        let resolution_hours: Vec<f64> = scoped
            .iter()
            .filter_map(|t| t.resolved_at.map(|r| (r - t.created_at).num_seconds() as f64 / 3600.0))
            .collect();
        let avg_resolution_hours = (!resolution_hours.is_empty())
            .then(|| resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64);

        Ok(DashboardSummary {
            status_counts,
            total: scoped.len() as i64,
            open: scoped.iter().filter(|t| !t.status.is_terminal()).count() as i64,
            overdue: scoped.iter().filter(|t| t.is_overdue(now)).count() as i64,
            avg_resolution_hours,
            total_downtime_hours: scoped.iter().filter_map(|t| t.downtime_hours).sum(),
            total_cost_avoidance: scoped.iter().filter_map(|t| t.cost_avoidance).sum(),
        })
    }

    async fn trend(&self, filter: &DashboardFilter) -> AppResult<Vec<TrendPoint>> {
        let data = self.data.read().await;
        let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();

        for ticket in data.tickets.values() {
            if in_scope(&data, ticket, filter) {
                days.entry(ticket.created_at.date_naive()).or_default().0 += 1;
            }
            if let Some(closed_at) = ticket.closed_at {
                if in_window(closed_at, filter) && in_plant(&data, ticket, filter) {
                    days.entry(closed_at.date_naive()).or_default().1 += 1;
                }
            }
        }

        Ok(days
            .into_iter()
            .map(|(date, (created, closed))| TrendPoint {
                date,
                created,
                closed,
            })
            .collect())
    }

    async fn top_reporters(
        &self,
        filter: &DashboardFilter,
        limit: i64,
    ) -> AppResult<Vec<ReporterCount>> {
        let data = self.data.read().await;
        let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
        for ticket in data.tickets.values().filter(|t| in_scope(&data, t, filter)) {
            *counts.entry(ticket.created_by).or_default() += 1;
        }

        let mut rows: Vec<ReporterCount> = counts
            .into_iter()
            .filter_map(|(user_id, tickets)| {
                data.users.get(&user_id).map(|u| ReporterCount {
                    user_id,
                    display_name: u.display_name.clone(),
                    tickets,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.tickets
                .cmp(&a.tickets)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

// SQLite-backed order and position store
//
// One connection behind a mutex. Every write that touches more than one row
// runs in an IMMEDIATE transaction so two processes sharing the database
// file serialize on the write lock before they read what they validate.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior,
};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::{
    NewOrder, NewPosition, Order, OrderFilter, Position, PositionFilter, Scope, StoreError,
    StoreResult, TradingStore,
};
use crate::order_ref;
use crate::types::{
    Instrument, OrderAction, OrderId, OrderState, PositionId, PositionState, Price, PriceCondition,
};

const ORDER_COLUMNS: &str = "id, task_id, strategy_executer_id, simulate, instrument, action, \
     direction, volume, price, price_condition, insert_time, finish_time, state, error_id, \
     error_msg, order_ref, position_id";

const POSITION_COLUMNS: &str = "id, task_id, strategy_executer_id, simulate, instrument, \
     direction, volume, open_time, open_price, close_price, close_time, state";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file
    pub fn open<P: AsRef<Path>>(db_path: P) -> StoreResult<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        // WAL lets readers run while a trader holds the write lock
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let store = Self::from_connection(conn)?;
        info!("SQLite store opened: {}", db_path.display());
        Ok(store)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_tables(&self) -> StoreResult<()> {
        let conn = self.conn();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER,
                strategy_executer_id INTEGER,
                simulate INTEGER NOT NULL DEFAULT 0,
                instrument TEXT NOT NULL,
                direction TEXT NOT NULL,
                volume INTEGER NOT NULL,
                open_time TEXT NOT NULL,
                open_price TEXT NOT NULL,
                close_price TEXT,
                close_time TEXT,
                state TEXT NOT NULL DEFAULT 'open',
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        // AUTOINCREMENT: ids, and so order refs, are never reused
        conn.execute(
            "CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER,
                strategy_executer_id INTEGER,
                simulate INTEGER NOT NULL DEFAULT 0,
                instrument TEXT NOT NULL,
                action TEXT NOT NULL,
                direction TEXT NOT NULL,
                volume INTEGER NOT NULL,
                price TEXT NOT NULL DEFAULT '0',
                price_condition TEXT NOT NULL,
                insert_time TEXT NOT NULL,
                finish_time TEXT,
                state TEXT NOT NULL DEFAULT 'insert',
                error_id INTEGER NOT NULL DEFAULT 0,
                error_msg TEXT NOT NULL DEFAULT '',
                order_ref TEXT UNIQUE,
                position_id INTEGER REFERENCES positions(id),
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_positions_scope ON positions(task_id, strategy_executer_id, state)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_orders_position ON orders(position_id, action, state)",
            [],
        )?;

        debug!("Database schema created/verified");
        Ok(())
    }
}

fn time_text(time: &DateTime<Utc>) -> String {
    // Fixed-width nanoseconds keep TEXT ordering chronological
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        task_id: row.get(1)?,
        strategy_executer_id: row.get(2)?,
        simulate: row.get(3)?,
        instrument: Instrument::new(row.get::<_, String>(4)?),
        action: parse_column::<OrderAction>(row, 5)?,
        direction: parse_column(row, 6)?,
        volume: row.get(7)?,
        price: row.get::<_, Price>(8)?,
        price_condition: parse_column::<PriceCondition>(row, 9)?,
        insert_time: parse_column(row, 10)?,
        finish_time: parse_optional_column(row, 11)?,
        state: parse_column::<OrderState>(row, 12)?,
        error_id: row.get(13)?,
        error_msg: row.get(14)?,
        order_ref: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
        position_id: row.get(16)?,
    })
}

fn position_from_row(row: &Row<'_>) -> rusqlite::Result<Position> {
    Ok(Position {
        id: row.get(0)?,
        task_id: row.get(1)?,
        strategy_executer_id: row.get(2)?,
        simulate: row.get(3)?,
        instrument: Instrument::new(row.get::<_, String>(4)?),
        direction: parse_column(row, 5)?,
        volume: row.get(6)?,
        open_time: parse_column(row, 7)?,
        open_price: row.get::<_, Price>(8)?,
        close_price: row.get::<_, Option<Price>>(9)?,
        close_time: parse_optional_column(row, 10)?,
        state: parse_column::<PositionState>(row, 11)?,
    })
}

fn load_order(conn: &Connection, id: OrderId) -> StoreResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
    Ok(conn.query_row(&sql, params![id], order_from_row).optional()?)
}

fn load_position(conn: &Connection, id: PositionId) -> StoreResult<Option<Position>> {
    let sql = format!("SELECT {} FROM positions WHERE id = ?1", POSITION_COLUMNS);
    Ok(conn.query_row(&sql, params![id], position_from_row).optional()?)
}

/// Two-phase insert: the id must exist before the reference can be derived
fn insert_order(conn: &Connection, order: &NewOrder) -> StoreResult<Order> {
    conn.execute(
        "INSERT INTO orders
         (task_id, strategy_executer_id, simulate, instrument, action, direction,
          volume, price, price_condition, insert_time, state, error_id, error_msg, position_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, '', ?12)",
        params![
            order.scope.task_id,
            order.scope.strategy_executer_id,
            order.simulate,
            order.instrument.as_str(),
            order.action.as_str(),
            order.direction.as_str(),
            order.volume,
            Price::ZERO,
            PriceCondition::Immediate.as_str(),
            time_text(&order.insert_time),
            OrderState::Insert.as_str(),
            order.position_id,
        ],
    )?;

    let id = conn.last_insert_rowid();
    let reference = order_ref::reference(id)?;
    conn.execute(
        "UPDATE orders SET order_ref = ?1 WHERE id = ?2",
        params![reference, id],
    )?;

    load_order(conn, id)?.ok_or(StoreError::OrderNotFound(id))
}

/// Explain why an order transition matched no row
fn order_transition_error(conn: &Connection, order_id: OrderId) -> StoreError {
    match load_order(conn, order_id) {
        Ok(Some(order)) => StoreError::OrderNotInFlight {
            order_id,
            state: order.state,
        },
        Ok(None) => StoreError::OrderNotFound(order_id),
        Err(e) => e,
    }
}

fn position_transition_error(conn: &Connection, position_id: PositionId) -> StoreError {
    match load_position(conn, position_id) {
        Ok(Some(_)) => StoreError::PositionNotOpen(position_id),
        Ok(None) => StoreError::PositionNotFound(position_id),
        Err(e) => e,
    }
}

fn push_scope(scope: &Scope, clauses: &mut Vec<String>, values: &mut Vec<Value>) {
    if let Some(task_id) = scope.task_id {
        clauses.push("task_id = ?".to_string());
        values.push(Value::Integer(task_id));
    }
    if let Some(strategy_executer_id) = scope.strategy_executer_id {
        clauses.push("strategy_executer_id = ?".to_string());
        values.push(Value::Integer(strategy_executer_id));
    }
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

impl TradingStore for SqliteStore {
    fn create_order(&self, order: &NewOrder) -> StoreResult<Order> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = insert_order(&tx, order)?;
        tx.commit()?;

        debug!(
            "Order created: id={} ref={} {} {} {} x{}",
            created.id,
            created.order_ref,
            created.action.as_str(),
            created.instrument,
            created.direction,
            created.volume
        );
        Ok(created)
    }

    fn create_close_order(&self, order: &NewOrder) -> StoreResult<Order> {
        let position_id = order
            .position_id
            .ok_or(StoreError::MissingPositionReference)?;

        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let position = load_position(&tx, position_id)?
            .ok_or(StoreError::PositionNotFound(position_id))?;
        if !position.is_open() {
            return Err(StoreError::PositionNotOpen(position_id));
        }

        let in_flight: Option<OrderId> = tx
            .query_row(
                "SELECT id FROM orders
                 WHERE position_id = ?1 AND action = ?2 AND state = ?3
                 LIMIT 1",
                params![
                    position_id,
                    OrderAction::Close.as_str(),
                    OrderState::Insert.as_str()
                ],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(order_id) = in_flight {
            return Err(StoreError::CloseInFlight {
                position_id,
                order_id,
            });
        }

        let created = insert_order(&tx, order)?;
        tx.commit()?;

        debug!(
            "Close order created: id={} ref={} position={}",
            created.id, created.order_ref, position_id
        );
        Ok(created)
    }

    fn record_open_fill(
        &self,
        order_id: OrderId,
        position: &NewPosition,
        finish_time: DateTime<Utc>,
    ) -> StoreResult<(Order, Position)> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match load_order(&tx, order_id)? {
            Some(order) if order.state == OrderState::Insert => {}
            Some(order) => {
                return Err(StoreError::OrderNotInFlight {
                    order_id,
                    state: order.state,
                })
            }
            None => return Err(StoreError::OrderNotFound(order_id)),
        }

        tx.execute(
            "INSERT INTO positions
             (task_id, strategy_executer_id, simulate, instrument, direction, volume,
              open_time, open_price, state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                position.scope.task_id,
                position.scope.strategy_executer_id,
                position.simulate,
                position.instrument.as_str(),
                position.direction.as_str(),
                position.volume,
                time_text(&position.open_time),
                position.open_price,
                PositionState::Open.as_str(),
            ],
        )?;
        let position_id = tx.last_insert_rowid();

        let updated = tx.execute(
            "UPDATE orders
             SET state = ?1, price = ?2, finish_time = ?3, position_id = ?4,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?5 AND state = ?6",
            params![
                OrderState::Finish.as_str(),
                position.open_price,
                time_text(&finish_time),
                position_id,
                order_id,
                OrderState::Insert.as_str(),
            ],
        )?;
        if updated != 1 {
            return Err(order_transition_error(&tx, order_id));
        }

        let order = load_order(&tx, order_id)?.ok_or(StoreError::OrderNotFound(order_id))?;
        let created = load_position(&tx, position_id)?
            .ok_or(StoreError::PositionNotFound(position_id))?;
        tx.commit()?;

        debug!(
            "Position saved: id={} {} [{}] qty={} @ {}",
            created.id, created.instrument, created.direction, created.volume, created.open_price
        );
        Ok((order, created))
    }

    fn record_close_fill(
        &self,
        order_id: OrderId,
        position_id: PositionId,
        price: Price,
        finish_time: DateTime<Utc>,
    ) -> StoreResult<(Order, Position)> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let finished_at = time_text(&finish_time);

        let closed = tx.execute(
            "UPDATE positions
             SET state = ?1, close_price = ?2, close_time = ?3, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?4 AND state = ?5",
            params![
                PositionState::Close.as_str(),
                price,
                finished_at,
                position_id,
                PositionState::Open.as_str(),
            ],
        )?;
        if closed != 1 {
            return Err(position_transition_error(&tx, position_id));
        }

        let updated = tx.execute(
            "UPDATE orders
             SET state = ?1, price = ?2, finish_time = ?3, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?4 AND state = ?5",
            params![
                OrderState::Finish.as_str(),
                price,
                finished_at,
                order_id,
                OrderState::Insert.as_str(),
            ],
        )?;
        if updated != 1 {
            return Err(order_transition_error(&tx, order_id));
        }

        let order = load_order(&tx, order_id)?.ok_or(StoreError::OrderNotFound(order_id))?;
        let position = load_position(&tx, position_id)?
            .ok_or(StoreError::PositionNotFound(position_id))?;
        tx.commit()?;

        debug!("Position closed: id={} @ {}", position.id, price);
        Ok((order, position))
    }

    fn record_rejection(
        &self,
        order_id: OrderId,
        error_id: i32,
        error_msg: &str,
        finish_time: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            "UPDATE orders
             SET state = ?1, error_id = ?2, error_msg = ?3, finish_time = ?4,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?5 AND state = ?6",
            params![
                OrderState::Error.as_str(),
                error_id,
                error_msg,
                time_text(&finish_time),
                order_id,
                OrderState::Insert.as_str(),
            ],
        )?;
        if updated != 1 {
            return Err(order_transition_error(&tx, order_id));
        }

        let order = load_order(&tx, order_id)?.ok_or(StoreError::OrderNotFound(order_id))?;
        tx.commit()?;

        debug!("Order {} marked error ({}): {}", order_id, error_id, error_msg);
        Ok(order)
    }

    fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        load_order(&self.conn(), id)
    }

    fn get_position(&self, id: PositionId) -> StoreResult<Option<Position>> {
        load_position(&self.conn(), id)
    }

    fn find_positions(&self, filter: &PositionFilter) -> StoreResult<Vec<Position>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        push_scope(&filter.scope, &mut clauses, &mut values);

        if let Some(state) = filter.state {
            clauses.push("state = ?".to_string());
            values.push(Value::Text(state.as_str().to_string()));
        }
        if let Some(direction) = filter.direction {
            clauses.push("direction = ?".to_string());
            values.push(Value::Text(direction.as_str().to_string()));
        }
        if let Some(instruments) = filter.instruments.as_deref().filter(|i| !i.is_empty()) {
            let placeholders = vec!["?"; instruments.len()].join(", ");
            clauses.push(format!("instrument IN ({})", placeholders));
            values.extend(
                instruments
                    .iter()
                    .map(|instrument| Value::Text(instrument.as_str().to_string())),
            );
        }

        let sql = format!(
            "SELECT {} FROM positions{} ORDER BY open_time ASC, id ASC",
            POSITION_COLUMNS,
            where_sql(&clauses)
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let positions = stmt
            .query_map(params_from_iter(values.iter()), position_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} positions (filter: {:?})", positions.len(), filter);
        Ok(positions)
    }

    fn find_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        push_scope(&filter.scope, &mut clauses, &mut values);

        if let Some(state) = filter.state {
            clauses.push("state = ?".to_string());
            values.push(Value::Text(state.as_str().to_string()));
        }
        if let Some(position_id) = filter.position_id {
            clauses.push("position_id = ?".to_string());
            values.push(Value::Integer(position_id));
        }

        let sql = format!(
            "SELECT {} FROM orders{} ORDER BY id ASC",
            ORDER_COLUMNS,
            where_sql(&clauses)
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(values.iter()), order_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn scope() -> Scope {
        Scope {
            task_id: Some(1),
            strategy_executer_id: None,
        }
    }

    fn new_order(action: OrderAction, position_id: Option<PositionId>) -> NewOrder {
        NewOrder {
            scope: scope(),
            simulate: true,
            instrument: Instrument::new("rb2410"),
            action,
            direction: Direction::Buy,
            volume: 2,
            position_id,
            insert_time: Utc::now(),
        }
    }

    fn new_position(open_time: DateTime<Utc>) -> NewPosition {
        NewPosition {
            scope: scope(),
            simulate: true,
            instrument: Instrument::new("rb2410"),
            direction: Direction::Buy,
            volume: 2,
            open_time,
            open_price: Price::new(dec!(3500)),
        }
    }

    fn open_position(store: &SqliteStore, open_time: DateTime<Utc>) -> Position {
        let order = store.create_order(&new_order(OrderAction::Open, None)).unwrap();
        store
            .record_open_fill(order.id, &new_position(open_time), open_time)
            .unwrap()
            .1
    }

    #[test]
    fn test_create_order_assigns_reference_from_id() {
        let store = SqliteStore::in_memory().unwrap();
        let first = store.create_order(&new_order(OrderAction::Open, None)).unwrap();
        let second = store.create_order(&new_order(OrderAction::Open, None)).unwrap();

        assert_eq!(first.order_ref, order_ref::reference(first.id).unwrap());
        assert_eq!(second.order_ref, order_ref::reference(second.id).unwrap());
        assert_ne!(first.order_ref, second.order_ref);
        assert_eq!(first.state, OrderState::Insert);
        assert!(first.price.is_zero());
    }

    #[test]
    fn test_open_fill_links_order_and_position() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Utc::now();
        let order = store.create_order(&new_order(OrderAction::Open, None)).unwrap();
        let (order, position) = store
            .record_open_fill(order.id, &new_position(now), now)
            .unwrap();

        assert_eq!(order.state, OrderState::Finish);
        assert_eq!(order.position_id, Some(position.id));
        assert_eq!(order.price, Price::new(dec!(3500)));
        assert_eq!(position.state, PositionState::Open);
        assert_eq!(position.open_time, now);
        assert_eq!(store.get_position(position.id).unwrap(), Some(position));
    }

    #[test]
    fn test_terminal_orders_reject_transitions() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Utc::now();
        let order = store.create_order(&new_order(OrderAction::Open, None)).unwrap();
        store.record_rejection(order.id, 31, "no margin", now).unwrap();

        let err = store
            .record_open_fill(order.id, &new_position(now), now)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::OrderNotInFlight {
                state: OrderState::Error,
                ..
            }
        ));
        let err = store.record_rejection(order.id, 1, "again", now).unwrap_err();
        assert!(matches!(err, StoreError::OrderNotInFlight { .. }));
        assert!(store.find_positions(&PositionFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_close_order_claims_position_once() {
        let store = SqliteStore::in_memory().unwrap();
        let position = open_position(&store, Utc::now());

        let first = store
            .create_close_order(&new_order(OrderAction::Close, Some(position.id)))
            .unwrap();
        let err = store
            .create_close_order(&new_order(OrderAction::Close, Some(position.id)))
            .unwrap_err();
        assert!(matches!(err, StoreError::CloseInFlight { order_id, .. } if order_id == first.id));

        // A rejected close frees the position for a retry
        store.record_rejection(first.id, 31, "no margin", Utc::now()).unwrap();
        let retry = store
            .create_close_order(&new_order(OrderAction::Close, Some(position.id)))
            .unwrap();
        let (_, closed) = store
            .record_close_fill(retry.id, position.id, Price::new(dec!(3510)), Utc::now())
            .unwrap();
        assert_eq!(closed.state, PositionState::Close);
        assert_eq!(closed.close_price, Some(Price::new(dec!(3510))));

        let err = store
            .create_close_order(&new_order(OrderAction::Close, Some(position.id)))
            .unwrap_err();
        assert!(matches!(err, StoreError::PositionNotOpen(_)));
    }

    #[test]
    fn test_close_order_for_missing_position() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store
            .create_close_order(&new_order(OrderAction::Close, Some(99)))
            .unwrap_err();
        assert!(matches!(err, StoreError::PositionNotFound(99)));
        assert!(store.find_orders(&OrderFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_find_positions_orders_by_open_time_and_filters() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Utc::now();
        let later = open_position(&store, now);
        let earlier = open_position(&store, now - Duration::minutes(5));

        let all = store.find_positions(&PositionFilter::default()).unwrap();
        assert_eq!(
            all.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![earlier.id, later.id]
        );

        let filter = PositionFilter {
            instruments: Some(vec![Instrument::new("i2409")]),
            ..Default::default()
        };
        assert!(store.find_positions(&filter).unwrap().is_empty());

        let filter = PositionFilter {
            instruments: Some(Vec::new()),
            direction: Some(Direction::Buy),
            state: Some(PositionState::Open),
            ..Default::default()
        };
        assert_eq!(store.find_positions(&filter).unwrap().len(), 2);

        let other_task = PositionFilter {
            scope: Scope {
                task_id: Some(2),
                strategy_executer_id: None,
            },
            ..Default::default()
        };
        assert!(store.find_positions(&other_task).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("trading.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            open_position(&store, Utc::now()).id
        };

        let store = SqliteStore::open(&path).unwrap();
        let position = store.get_position(id).unwrap().unwrap();
        assert_eq!(position.open_price, Price::new(dec!(3500)));
        assert_eq!(store.find_orders(&OrderFilter::default()).unwrap().len(), 1);
    }
}

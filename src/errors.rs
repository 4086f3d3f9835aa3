use schema::DbSymbol;

/// Main error type for the battle core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleEngineError {
    /// Static data is missing or malformed. Fatal at battle setup.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// The caller asked for something the battle cannot do right now
    #[error("Battle state error: {0}")]
    BattleState(#[from] BattleStateError),
    /// A submitted action is malformed
    #[error("Action error: {0}")]
    Action(#[from] ActionError),
    /// An effect or handler broke a battle invariant. Aborts the battle.
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Errors related to static database lookups and loading
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("move not found: {0}")]
    MoveNotFound(DbSymbol),
    #[error("ability not found: {0}")]
    AbilityNotFound(DbSymbol),
    #[error("item not found: {0}")]
    ItemNotFound(DbSymbol),
    #[error("creature not found: {0}")]
    CreatureNotFound(DbSymbol),
    /// A move names a battle procedure that is not registered
    #[error("move {move_symbol} uses unknown procedure '{method}'")]
    UnknownMoveProcedure { move_symbol: DbSymbol, method: String },
    #[error("failed to parse {what}: {details}")]
    Parse { what: String, details: String },
    #[error("failed to read {path}: {details}")]
    Io { path: String, details: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors related to battle state validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleStateError {
    #[error("invalid bank index: {0}")]
    InvalidBank(u8),
    #[error("invalid position: bank {bank}, slot {slot}")]
    InvalidPosition { bank: u8, slot: u8 },
    #[error("invalid battler: bank {bank}, party index {party_index}")]
    InvalidBattler { bank: u8, party_index: u8 },
    #[error("battler is not on the field")]
    NotOnField,
    #[error("the battle is already over")]
    BattleOver,
    #[error("no animation is awaiting acknowledgement")]
    NothingToAcknowledge,
    #[error("a round is already in progress")]
    RoundInProgress,
    #[error("actions are missing for {0} battler(s)")]
    ActionsMissing(usize),
    #[error("position does not need a replacement")]
    ReplacementNotNeeded,
}

/// Errors related to submitted actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("invalid move index: {0}")]
    InvalidMoveIndex(usize),
    #[error("invalid party index: {0}")]
    InvalidPartyIndex(usize),
    #[error("move has no PP left")]
    NoPpRemaining,
    #[error("switch target has fainted")]
    SwitchTargetFainted,
    #[error("switch target is already in battle")]
    SwitchTargetActive,
    #[error("battler already has an action this round")]
    DuplicateAction,
    #[error("item {0} cannot be used in battle")]
    ItemNotUsable(DbSymbol),
    #[error("item {0} is not in the bag")]
    ItemNotInBag(DbSymbol),
    #[error("cannot mega evolve")]
    MegaUnavailable,
    #[error("cannot flee from this battle")]
    CannotFlee,
    #[error("the acting battler has fainted")]
    UserFainted,
    #[error("this action is queued by the engine, not chosen")]
    NotChoosable,
}

/// Broken battle invariants. These point at a bug in an effect or handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("stat stage {stage} outside [-6, 6]")]
    StageOutOfRange { stage: i8 },
    #[error("hp {hp} inconsistent with max hp {max_hp} (fainted: {fainted})")]
    HpOutOfRange { hp: u16, max_hp: u16, fainted: bool },
    #[error("unknown hook name: {0}")]
    UnknownHook(String),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using DataError
pub type DataResult<T> = Result<T, DataError>;

use serde::{Deserialize, Serialize};

/// Bech32 contract or wallet address.
pub type Addr = String;
pub type TokenId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenItem {
    pub id: TokenId,
}

impl TokenItem {
    pub fn new(id: impl Into<TokenId>) -> Self {
        TokenItem { id: id.into() }
    }
}

/// Tokens of one collection held by a single borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collateral {
    pub owner: Addr,
    pub token_item_list: Vec<TokenItem>,
}

impl Collateral {
    pub fn holds(&self, token_id: &str) -> bool {
        self.token_item_list.iter().any(|x| x.id == token_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralByCollection {
    pub address: Addr,
    pub collateral: Vec<Collateral>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub amount: u128,
    pub creation_date: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub loan: Loan,
    pub accumulated_loan: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerEntry {
    pub address: Addr,
    pub borrower: Borrower,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    pub borrow_apr: f64,
    pub bid_min_rate: f64,
    pub discount_min_rate: f64,
    pub discount_max_rate: f64,
    pub liquidation_fee_rate: f64,
    pub borrow_fee_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceItem {
    pub collection: Addr,
    pub price: u128,
}

/// Oracle prices; `is_outdated` covers the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub data: Vec<PriceItem>,
    pub is_outdated: bool,
}

impl PriceSnapshot {
    pub fn price_of(&self, collection: &str) -> Option<u128> {
        find_price(&self.data, collection)
    }
}

pub fn find_price(price_list: &[PriceItem], collection: &str) -> Option<u128> {
    price_list
        .iter()
        .find(|x| x.collection == collection)
        .map(|x| x.price)
}

/// Bid variants, ordered by matching priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidType {
    /// Floating price: `floor_price * (1 - discount)`, drained proportionally.
    LiquidationBid,
    /// Fixed price: the whole offer amount after discount, used up by one token.
    CollectionOffer,
}

/// Liquidation bid as stored by the lending platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationBid {
    pub liquidator: Addr,
    pub amount: u128,
    pub discount: f64,
    pub creation_date: u64,
    pub token_id_list: Vec<TokenId>,
    pub bid_type: BidType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidsByCollection {
    pub collection_address: Addr,
    pub liquidation_bids: Vec<LiquidationBid>,
}

/// Marketplace collection offers for one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionOffers {
    pub collection_address: Addr,
    pub price_list: Vec<u128>,
}

/// Unified entry of the working bid pool: on-chain bids and synthesized
/// marketplace offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolBid {
    pub collection_address: Addr,
    pub liquidator: Addr,
    pub creation_date: u64,
    pub token_id_list: Vec<TokenId>,
    pub amount: u128,
    pub discount: f64,
    pub bid_type: BidType,
    /// Set only for synthesized marketplace offers.
    pub collection_offer_id: Option<u32>,
}

impl PoolBid {
    pub fn covers(&self, collection: &str, token_id: &str) -> bool {
        self.collection_address == collection && self.token_id_list.iter().any(|id| id == token_id)
    }
}

/// One collateral token priced against the bid that won it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiddedCollateralItem {
    pub collection: Addr,
    pub token_item: TokenItem,
    pub owner: Addr,
    pub liquidator: Addr,
    pub bid_creation_date: u64,
    pub liquidation_price: u128,
    pub collateral_price: u128,
    pub bid_amount: u128,
    pub bid_discount: f64,
    pub bid_type: BidType,
    #[serde(skip)]
    pub collection_offer_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationItem {
    pub borrower: Addr,
    pub liquidation_set: Vec<BiddedCollateralItem>,
}

/// Borrower above the ltv ceiling together with the state needed to size
/// its liquidation.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetBorrower {
    pub borrower_address: Addr,
    pub ltv: f64,
    pub loan_amount: u128,
    pub loan_creation_date: u64,
    pub accumulated_loan: u128,
    pub collateral_value: u128,
    pub collection_and_collateral_list: Vec<(Addr, Collateral)>,
}

/// Market maker vault state of one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMakerLiquidity {
    pub amount_undistributed: u128,
    pub price_list: Vec<u128>,
}

// Chapter 3: Small Promises. Coupons and a careful checklist.
use super::{Chapter, Level, Mechanic};

pub fn chapter() -> Chapter {
    Chapter {
        id: "promises".to_string(),
        title: "Small Promises".to_string(),
        direction: "Promises are lighter to carry when they are written down. Collect them, keep them, spend them slowly.".to_string(),
        levels: vec![
            Level {
                id: "c3-l1".to_string(),
                title: "Coupons".to_string(),
                direction: "Eight small promises are folded in the drawer by the bed. Each can be redeemed once.".to_string(),
                action: "Redeem a coupon whenever you wish.".to_string(),
                item: Some("Coupon book".to_string()),
                mechanics: Some(Mechanic::Redeemables { count: Some(8) }),
            },
            Level {
                id: "c3-l2".to_string(),
                title: "Preparing the Room".to_string(),
                direction: "The room must be ready before the last chapter. Precision matters; take your time.".to_string(),
                action: "Complete every step.".to_string(),
                item: Some("None.".to_string()),
                mechanics: Some(Mechanic::Checklist {
                    steps: vec![
                        "Clear the bed".to_string(),
                        "Light the candle".to_string(),
                        "Lay out everything earned so far".to_string(),
                        "Silence the phones".to_string(),
                    ],
                }),
            },
        ],
    }
}

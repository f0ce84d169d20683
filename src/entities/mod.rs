pub mod category;
pub mod contact;
pub mod order;
pub mod order_item;
pub mod parameter;
pub mod product;
pub mod product_info;
pub mod product_parameter;
pub mod shop;
pub mod shop_category;

pub use category::{Entity as Category, Model as CategoryModel};
pub use contact::{Entity as Contact, Model as ContactModel};
pub use order::{Entity as Order, Model as OrderModel, OrderState};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use parameter::{Entity as Parameter, Model as ParameterModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_info::{Entity as ProductInfo, Model as ProductInfoModel};
pub use product_parameter::{Entity as ProductParameter, Model as ProductParameterModel};
pub use shop::{Entity as Shop, Model as ShopModel};
pub use shop_category::{Entity as ShopCategory, Model as ShopCategoryModel};
